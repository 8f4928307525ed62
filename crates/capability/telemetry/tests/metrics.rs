use devsim_telemetry::{
    metrics, new_instance_id, record_frame_matched, record_frame_received, record_reply_sent,
};

#[test]
fn instance_ids_are_unique() {
    let a = new_instance_id();
    let b = new_instance_id();
    assert!(!a.is_empty());
    assert_ne!(a, b);
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot();
    record_frame_received();
    record_frame_matched();
    record_reply_sent(6);
    let after = metrics().snapshot();

    assert!(after.frames_received > before.frames_received);
    assert!(after.frames_matched > before.frames_matched);
    assert!(after.replies_sent > before.replies_sent);
    assert!(after.bytes_sent >= before.bytes_sent + 6);
}
