use beacon_protocol::{codec, ChatClientEvent, ChatServerEvent, SignalClientEvent};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn bench_encode(c: &mut Criterion) {
    let room_message = ChatServerEvent::message("alice", "the quick brown fox jumps over the lazy dog");

    c.bench_function("encode_room_message", |b| {
        b.iter(|| codec::encode(black_box(&room_message)).unwrap());
    });
}

fn bench_decode(c: &mut Criterion) {
    let room_message = r#"{"event":"message","data":{"room":"lobby","message":"the quick brown fox jumps over the lazy dog"}}"#;

    c.bench_function("decode_room_message", |b| {
        b.iter(|| codec::decode::<ChatClientEvent>(black_box(room_message)).unwrap());
    });

    // A realistic SDP runs to a few kilobytes of opaque payload.
    let sdp_lines: String = (0..60)
        .map(|i| format!("a=candidate:{i} 1 UDP 2122252543 192.0.2.{i} 54400 typ host\\r\\n"))
        .collect();
    let offer = serde_json::to_string(&json!({
        "event": "offer",
        "data": {"toUserId": "u2", "offer": {"type": "offer", "sdp": sdp_lines}}
    }))
    .unwrap();

    c.bench_function("decode_offer", |b| {
        b.iter(|| codec::decode::<SignalClientEvent>(black_box(&offer)).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
