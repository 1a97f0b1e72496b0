use super::*;

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

#[test]
fn parse_reads_basic_lines() {
    let lines = parse("[00:01.50]Hello\n[00:03.00]World");
    assert_eq!(
        lines,
        vec![
            LyricLine {
                time: Duration::from_millis(1500),
                text: "Hello".into()
            },
            LyricLine {
                time: Duration::from_secs(3),
                text: "World".into()
            },
        ]
    );
}

#[test]
fn current_index_clamps_both_ends() {
    let lines = parse("[00:01.50]Hello\n[00:03.00]World");
    assert_eq!(current_index(secs(2.0), &lines), 0);
    assert_eq!(current_index(secs(0.0), &lines), 0);
    assert_eq!(current_index(secs(5.0), &lines), 1);
    assert_eq!(current_index(secs(3.0), &lines), 1);
}

#[test]
fn multiple_tags_share_text_and_sort() {
    let lines = parse("[00:10.00][00:02.00]Chorus\n[00:05.00]Verse");
    let got: Vec<(u128, &str)> = lines
        .iter()
        .map(|l| (l.time.as_millis(), l.text.as_str()))
        .collect();
    assert_eq!(got, vec![(2000, "Chorus"), (5000, "Verse"), (10000, "Chorus")]);
}

#[test]
fn equal_timestamps_keep_encounter_order() {
    let lines = parse("[00:01.00]first\n[00:00.50]zero\n[00:01.00]second");
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["zero", "first", "second"]);
}

#[test]
fn untagged_and_metadata_lines_are_ignored() {
    let lines = parse("[ar:Someone]\n[ti:Title]\nplain text\n\n[01:00.00]  One minute  ");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].time, Duration::from_secs(60));
    assert_eq!(lines[0].text, "One minute");
}

#[test]
fn line_endings_are_agnostic() {
    let unix = parse("[00:01.00]a\n[00:02.00]b");
    let dos = parse("[00:01.00]a\r\n[00:02.00]b\r\n");
    let mac = parse("[00:01.00]a\r[00:02.00]b");
    assert_eq!(unix, dos);
    assert_eq!(unix, mac);
}

#[test]
fn tag_variants_are_accepted() {
    let lines = parse("[00:01]a\n[00:02:50]b\n[00:03.5]c\n[00:04.250]d");
    let ms: Vec<u128> = lines.iter().map(|l| l.time.as_millis()).collect();
    assert_eq!(ms, vec![1000, 2500, 3500, 4250]);
}

#[test]
fn current_index_is_monotone_in_position() {
    let lines = parse("[00:00.50]a\n[00:01.00]b\n[00:01.00]c\n[00:04.00]d\n[01:00.00]e");
    let mut last = 0;
    for step in 0..700 {
        let idx = current_index(Duration::from_millis(step * 100), &lines);
        assert!(idx >= last, "index went backwards at step {step}");
        assert!(idx < lines.len());
        last = idx;
    }
    assert_eq!(last, lines.len() - 1);
}

#[test]
fn current_index_on_empty_is_zero() {
    assert_eq!(current_index(secs(1.0), &[]), 0);
}

#[test]
fn overflowing_tag_is_dropped_and_later_lines_parse() {
    let lines = parse("[99999999999999999:00.00]boom\n[00:01.00]ok");
    assert_eq!(
        lines,
        vec![LyricLine {
            time: secs(1.0),
            text: "ok".into(),
        }]
    );

    let huge_seconds = parse("[00:18446744073709552:00]x\n[00:02]y");
    assert_eq!(huge_seconds.len(), 1);
    assert_eq!(huge_seconds[0].text, "y");
}
