//! Wire-level properties, observed by tapping the endpoint fan-out
//! with an extra subscriber next to the real session.

use serde_json::{json, Value};
use tether_rpc::{expose, wrap, Payload};
use tether_transport::MemoryEndpoint;

/// Receives messages until one satisfies `pick`, returning it.
async fn recv_matching(
    stream: &mut tether_transport::MessageStream,
    pick: impl Fn(&Value) -> bool,
) -> Value {
    loop {
        let message = stream.recv().await.expect("stream closed while waiting");
        if pick(&message) {
            return message;
        }
    }
}

/// A plain call crosses the wire in exactly the documented shape, and
/// its reply inlines the result.
#[tokio::test]
async fn call_and_response_wire_shape() {
    let (near, far) = MemoryEndpoint::pair();
    expose(
        Payload::object([(
            "add",
            Payload::function(|args: Vec<Payload>| async move {
                let a = args[0].as_i64().ok_or("a must be a number")?;
                let b = args[1].as_i64().ok_or("b must be a number")?;
                Ok(Payload::from(a + b))
            }),
        )]),
        far.clone(),
    );

    let mut requests = far.subscribe();
    let mut replies = near.subscribe();

    let root = wrap(near);
    let pending = tokio::spawn(async move {
        root.get("add").call(vec![2i64.into(), 3i64.into()]).await
    });

    let request = recv_matching(&mut requests, |m| m["type"] == json!("call")).await;
    let id = request["id"].clone();
    assert_eq!(
        request,
        json!({
            "id": id,
            "type": "call",
            "keyChain": ["add"],
            "args": [
                {"type": "any", "data": 2},
                {"type": "any", "data": 3},
            ],
        }),
    );

    let reply = recv_matching(&mut replies, |m| m["type"] == json!("response")).await;
    assert_eq!(
        reply,
        json!({"id": id, "type": "response", "data": {"type": "any", "data": 5}}),
    );

    assert_eq!(pending.await.unwrap().unwrap().as_i64(), Some(5));
}

/// An await request names the full chain and nothing else.
#[tokio::test]
async fn await_wire_shape() {
    let (near, far) = MemoryEndpoint::pair();
    expose(
        Payload::object([(
            "a",
            Payload::object([("b", Payload::data(json!({"c": 7})))]),
        )]),
        far.clone(),
    );

    let mut requests = far.subscribe();
    let root = wrap(near);
    let pending = tokio::spawn(async move { root.get("a").get("b").get("c").await });

    let request = recv_matching(&mut requests, |m| m["type"] == json!("await")).await;
    assert_eq!(request["keyChain"], json!(["a", "b", "c"]));
    assert!(request.get("args").is_none());

    assert_eq!(pending.await.unwrap().unwrap().as_i64(), Some(7));
}

/// Request ids on one session never repeat.
#[tokio::test]
async fn request_ids_are_pairwise_distinct() {
    let (near, far) = MemoryEndpoint::pair();
    expose(
        Payload::object([("x", Payload::from(1i64))]),
        far.clone(),
    );

    let mut requests = far.subscribe();
    let root = wrap(near);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..10 {
        root.get("x").resolve().await.unwrap();
        let request = recv_matching(&mut requests, |m| m["type"] == json!("await")).await;
        assert!(seen.insert(request["id"].to_string()), "id reused: {request}");
    }
}

/// Property access alone never posts a message; only terminal
/// operations do.
#[tokio::test]
async fn property_access_is_silent_on_the_wire() {
    let (near, far) = MemoryEndpoint::pair();
    let mut tap = far.subscribe();

    let root = wrap(near);
    let chain = root.get("a").get("b").get("c");
    let _sibling = root.get("d");
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(tap.try_recv(), None);

    // The first terminal operation is also the first message.
    let _pending = tokio::spawn(async move { chain.resolve().await });
    let first = tap.recv().await.unwrap();
    assert_eq!(first["type"], json!("await"));
}

/// A function-valued argument crosses as a wrapped reference, and the
/// callback traffic runs on the sub-channel named by its id.
#[tokio::test]
async fn callback_argument_is_wrapped_on_the_wire() {
    let (near, far) = MemoryEndpoint::pair();
    expose(
        Payload::object([(
            "run",
            Payload::function(|args: Vec<Payload>| async move {
                let callback = args
                    .into_iter()
                    .next()
                    .and_then(|arg| arg.as_proxy().cloned())
                    .ok_or("argument must be callable")?;
                callback.call(vec![]).await.map_err(|err| err.to_string())
            }),
        )]),
        far.clone(),
    );

    let mut requests = far.subscribe();
    let mut near_tap = near.subscribe();
    let root = wrap(near);
    let pending = tokio::spawn(async move {
        root.get("run")
            .call(vec![Payload::function(|_args: Vec<Payload>| async move {
                Ok(Payload::from("called back"))
            })])
            .await
    });

    let request = recv_matching(&mut requests, |m| m["type"] == json!("call")).await;
    assert_eq!(request["args"][0]["type"], json!("wraped"));
    let callback_id = request["args"][0]["id"].clone();

    // The server's call to the callback travels inside the sub-channel
    // envelope tagged with that id.
    let envelope = recv_matching(&mut near_tap, |m| m.get("channel").is_some()).await;
    assert_eq!(envelope["channel"], callback_id);
    assert_eq!(envelope["payload"]["type"], json!("call"));

    assert_eq!(pending.await.unwrap().unwrap().as_str(), Some("called back"));
}

/// Every construct reply is wrapped, even when the instance is plain
/// data that could have been copied.
#[tokio::test]
async fn construct_reply_is_always_wrapped() {
    let (near, far) = MemoryEndpoint::pair();
    expose(
        Payload::object([(
            "Plain",
            Payload::constructor(|_args: Vec<Payload>| async move {
                Ok(Payload::data(json!({"x": 1})))
            }),
        )]),
        far,
    );

    let mut replies = near.subscribe();
    let root = wrap(near.clone());
    let pending = tokio::spawn(async move { root.get("Plain").construct(vec![]).await });

    let reply = recv_matching(&mut replies, |m| m["type"] == json!("response")).await;
    assert_eq!(reply["data"]["type"], json!("wraped"));

    // And the wrapped instance is a usable reference.
    let instance = pending.await.unwrap().unwrap();
    let instance = instance.as_proxy().cloned().expect("instance is a proxy");
    assert_eq!(instance.get("x").resolve().await.unwrap().as_i64(), Some(1));
}

/// Malformed messages draw an error reply when they carry a usable id
/// and are dropped silently otherwise.
#[tokio::test]
async fn malformed_messages_error_or_drop() {
    let (near, far) = MemoryEndpoint::pair();
    expose(Payload::object([("x", Payload::from(1i64))]), far);

    let mut replies = near.subscribe();

    // Unknown type, usable id: error reply under that id.
    near.post(json!({"id": 41, "type": "release"})).unwrap();
    let reply = recv_matching(&mut replies, |m| m["type"] == json!("error")).await;
    assert_eq!(reply["id"], json!(41));

    // No id at all: dropped. The next valid request still works, which
    // shows the dispatcher survived.
    near.post(json!({"type": "call"})).unwrap();
    near.post(json!(["not", "an", "object"])).unwrap();

    let root = wrap(near);
    assert_eq!(root.get("x").resolve().await.unwrap().as_i64(), Some(1));
}
