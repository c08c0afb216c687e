use std::time::Duration;

use super::*;
use crate::models::NoticeKind;

#[test]
fn test_notices_expire() {
    let mut notice = Notice::default();
    notice.info("saved");
    notice.add_message(NoticeMessage::warning("slow").with_duration(Duration::from_secs(30)));

    let shown_at = notice.messages[0].1;
    notice.expire(shown_at + NOTICE_DURATION + Duration::from_millis(1));

    assert_eq!(notice.len(), 1);
    assert_eq!(notice.messages[0].0.kind(), &NoticeKind::Warning);
}

#[test]
fn test_errors_stay_until_dismissed() {
    let mut notice = Notice::default();
    notice.add_message(NoticeMessage::error("request failed"));
    notice.add_message(NoticeMessage::error("timed").with_duration(Duration::from_secs(1)));

    let shown_at = notice.messages[0].1;
    notice.expire(shown_at + Duration::from_secs(3600));
    assert_eq!(notice.len(), 1);
    assert_eq!(notice.messages[0].0.message(), "request failed");

    assert!(notice.dismiss());
    assert!(notice.is_empty());
    assert!(!notice.dismiss());
}

#[test]
fn test_oldest_notice_is_dropped() {
    let mut notice = Notice::default();
    for i in 0..MAX_NOTICES + 2 {
        notice.info(format!("notice {i}"));
    }

    assert_eq!(notice.len(), MAX_NOTICES);
    assert_eq!(notice.messages[0].0.message(), "notice 2");
}
