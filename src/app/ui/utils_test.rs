use super::*;

fn line_text(line: &Line) -> String {
    line.spans.iter().map(|span| span.content.to_string()).collect()
}

#[test]
fn test_split_to_lines() {
    let lines = split_to_lines("buy milk and eggs", 9);
    let texts: Vec<String> = lines.iter().map(line_text).collect();
    assert_eq!(texts, vec!["buy milk", "and eggs"]);

    assert!(split_to_lines("", 10).is_empty());
}

#[test]
fn test_split_to_lines_long_word() {
    let lines = split_to_lines("a supercalifragilistic b", 5);
    let texts: Vec<String> = lines.iter().map(line_text).collect();
    assert_eq!(texts, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn test_split_to_lines_wide_chars() {
    // Each CJK character takes two cells
    let lines = split_to_lines("日本 語語", 4);
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line.width() <= 4);
    }
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is too long", 8), "this is…");
    assert_eq!(truncate("anything", 0), "");
    assert_eq!(truncate("日本語", 4), "日…");
}

#[test]
fn test_popup_area_is_centered() {
    let area = Rect::new(0, 0, 100, 50);
    let popup = popup_area(area, 40, 30);

    assert_eq!(popup.width, 40);
    assert_eq!(popup.height, 15);
    assert_eq!(popup.x, 30);
    assert!((17..=18).contains(&popup.y));
}

#[test]
fn test_notice_area_is_right_aligned() {
    let area = Rect::new(0, 0, 100, 50);
    let notice = notice_area(area, 30);

    assert_eq!(notice.width, 30);
    assert_eq!(notice.x, 70);
    assert_eq!(notice.height, 50);
}
