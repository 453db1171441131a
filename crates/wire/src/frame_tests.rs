use super::*;
use dbg_core::id::Koid;
use dbg_core::protocol::ReplyPayload;

#[test]
fn request_frame_round_trips_through_json() {
    let frame = Frame::Request { txn: 7, request: Request::Attach { koid: Koid::new(42) } };
    let json = serde_json::to_string(&frame).unwrap();
    let back: Frame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn reply_frame_round_trips_through_json() {
    let frame = Frame::Reply { txn: 7, reply: Reply::Ok(ReplyPayload::Empty) };
    let json = serde_json::to_string(&frame).unwrap();
    let back: Frame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, frame);
}

#[test]
fn notification_frame_round_trips_through_json() {
    let frame = Frame::Notification {
        notification: Notification::ProcessExiting { koid: Koid::new(1), exit_code: 0 },
    };
    let json = serde_json::to_string(&frame).unwrap();
    let back: Frame = serde_json::from_str(&json).unwrap();
    assert_eq!(back, frame);
}
