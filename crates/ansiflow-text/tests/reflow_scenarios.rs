//! End-to-end scenarios across the batch entry points.

use std::borrow::Cow;

use ansiflow_core::{ControlKind, ControlScanner, read_control};
use ansiflow_text::{
    CancelToken, ControlCategories, Error, Limits, Operation, ReflowOptions, Reflowed, TabStops,
    TermCaps, TextOptions, WarnPolicy, WarningKind, WarningSource, expand_tabs,
    find_next_control, reflow,
};

fn lines(out: Reflowed) -> Vec<Vec<String>> {
    let Reflowed::Lines(elements) = out else {
        panic!("expected all lines");
    };
    elements
        .into_iter()
        .map(|lines| {
            lines
                .into_iter()
                .map(|line| String::from_utf8(line).unwrap())
                .collect()
        })
        .collect()
}

// =============================================================================
// Scanner
// =============================================================================

#[test]
fn sgr_runs_in_colored_word() {
    let text = b"\x1b[31mHELLO\x1b[0m";
    let runs: Vec<_> = ControlScanner::new(ControlCategories::SGR)
        .matches(text)
        .map(|m| (m.start, m.len, m.valid))
        .collect();
    assert_eq!(runs, vec![(0, 5, true), (10, 4, true)]);
    for (start, _, _) in runs {
        let seq = read_control(text, start, Default::default()).unwrap();
        assert_eq!(seq.kind, ControlKind::Sgr);
    }
}

#[test]
fn csi_only_scan_skips_sgr() {
    let found = find_next_control(b"\x1b[31mHELLO\x1b[0m", ControlCategories::CSI);
    assert!(!found.is_match());
    assert!(found.observed.contains(ControlCategories::SGR));
    assert!(found.valid);
}

// =============================================================================
// Tabs
// =============================================================================

#[test]
fn tab_to_four() {
    let out = expand_tabs(&["a\tb"], &TabStops::uniform(4).unwrap(), &TextOptions::new()).unwrap();
    assert_eq!(out.value, vec![Cow::Borrowed(&b"a   b"[..])]);
    assert!(out.warnings.is_empty());
}

#[test]
fn tab_overflow_produces_nothing() {
    let opts = TextOptions::new().limits(Limits::new(10).unwrap());
    let result = expand_tabs(&["short", "\t\t"], &TabStops::uniform(8).unwrap(), &opts);
    assert_eq!(
        result,
        Err(Error::Overflow {
            operation: Operation::TabExpansion,
            limit: 10
        })
    );
}

#[test]
fn reflow_expands_tabs_in_text_and_prefix() {
    let reflow_opts = ReflowOptions::new(20)
        .strip_spaces(false)
        .prefix("\t")
        .tabs_as_spaces(TabStops::uniform(2).unwrap());
    let out = reflow(&["a\tb"], &reflow_opts, &TextOptions::new()).unwrap();
    assert_eq!(lines(out.value), vec![vec!["  a b".to_string()]]);
}

// =============================================================================
// Reflow
// =============================================================================

#[test]
fn quick_brown_fox_padded() {
    let reflow_opts = ReflowOptions::new(10).pad(Some(' '));
    let out = reflow(&["The quick brown fox"], &reflow_opts, &TextOptions::new()).unwrap();
    assert_eq!(
        lines(out.value),
        vec![vec!["The quick ".to_string(), "brown fox ".to_string()]]
    );
}

#[test]
fn style_closed_and_reopened() {
    let out = reflow(
        &["\x1b[31mredredred text\x1b[0m"],
        &ReflowOptions::new(10),
        &TextOptions::new(),
    )
    .unwrap();
    assert_eq!(
        lines(out.value),
        vec![vec![
            "\x1b[31mredredred\x1b[0m".to_string(),
            "\x1b[31mtext\x1b[0m".to_string()
        ]]
    );
}

#[test]
fn merged_style_reopened_as_one_sequence() {
    let out = reflow(
        &["\x1b[1m\x1b[4maaa bbb\x1b[0m"],
        &ReflowOptions::new(3),
        &TextOptions::new(),
    )
    .unwrap();
    assert_eq!(
        lines(out.value),
        vec![vec![
            "\x1b[1m\x1b[4maaa\x1b[0m".to_string(),
            "\x1b[1;4mbbb\x1b[0m".to_string()
        ]]
    );
}

#[test]
fn paragraphs_with_prefixes() {
    let reflow_opts = ReflowOptions::new(12)
        .initial("1. ")
        .prefix("   ")
        .indent(0);
    let out = reflow(
        &["first item text\n\nnext para", "second item"],
        &reflow_opts,
        &TextOptions::new(),
    )
    .unwrap();
    assert_eq!(
        lines(out.value),
        vec![
            vec![
                "1. first".to_string(),
                "   item text".to_string(),
                "1. ".to_string(),
                "1. next para".to_string(),
            ],
            vec!["   second".to_string(), "   item".to_string()],
        ]
    );
}

#[test]
fn first_lines_only() {
    let reflow_opts = ReflowOptions::new(5).wrap_always(true).first_line_only(true);
    let out = reflow(&["abcdefgh", "ab cd ef"], &reflow_opts, &TextOptions::new()).unwrap();
    assert_eq!(
        out.value,
        Reflowed::FirstLines(vec![b"abcde".to_vec(), b"ab cd".to_vec()])
    );
}

// =============================================================================
// Warnings
// =============================================================================

#[test]
fn warnings_once_by_default() {
    let input: [&[u8]; 3] = [b"ok", b"bad\xff", b"worse\xfe"];
    let out = reflow(&input, &ReflowOptions::new(80), &TextOptions::new()).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].source, WarningSource::Element(1));
    assert_eq!(out.warnings[0].kind, WarningKind::MalformedUtf8);
    assert_eq!(out.warnings[0].byte, 3);
}

#[test]
fn warnings_every_element() {
    let input: [&[u8]; 3] = [b"ok", b"bad\xff", b"\x1b[38;2;1;2;3mx"];
    let opts = TextOptions::new().warn(WarnPolicy::Every);
    let out = reflow(&input, &ReflowOptions::new(80), &opts).unwrap();
    let kinds: Vec<_> = out.warnings.iter().map(|w| (w.source, w.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (WarningSource::Element(1), WarningKind::MalformedUtf8),
            (WarningSource::Element(2), WarningKind::UnsupportedSgr),
        ]
    );
    // Truecolor is forwarded verbatim even when unsupported.
    assert_eq!(
        lines(out.value)[2],
        vec!["\x1b[38;2;1;2;3mx\x1b[0m".to_string()]
    );
}

#[test]
fn truecolor_capability_silences_warning() {
    let opts = TextOptions::new()
        .warn(WarnPolicy::Every)
        .caps(TermCaps::from_names(["bright", "256", "truecolor"]).unwrap());
    let out = reflow(&["\x1b[38;2;1;2;3mx"], &ReflowOptions::new(80), &opts).unwrap();
    assert!(out.warnings.is_empty());
}

#[test]
fn warnings_silent() {
    let input: [&[u8]; 1] = [b"bad\xff"];
    let opts = TextOptions::new().warn(WarnPolicy::Silent);
    let out = reflow(&input, &ReflowOptions::new(80), &opts).unwrap();
    assert!(out.warnings.is_empty());
}

#[test]
fn prefix_warning_source() {
    let reflow_opts = ReflowOptions::new(80).prefix(b"\xff".to_vec()).initial("> ");
    let opts = TextOptions::new().warn(WarnPolicy::Every);
    let out = reflow(&["text"], &reflow_opts, &opts).unwrap();
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].source, WarningSource::Prefix);
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn cancelled_batch_returns_no_output() {
    let token = CancelToken::new();
    token.cancel();
    let opts = TextOptions::new().cancel(token);
    assert_eq!(
        reflow(&["a", "b"], &ReflowOptions::new(10), &opts),
        Err(Error::Cancelled { processed: 0 })
    );
    assert!(matches!(
        expand_tabs(&["\t"], &TabStops::default(), &opts),
        Err(Error::Cancelled { .. })
    ));
}

#[test]
fn cancellation_seen_by_later_calls() {
    let token = CancelToken::new();
    let opts = TextOptions::new().cancel(token.clone());
    let input = vec!["x"; 1500];
    assert!(reflow(&input, &ReflowOptions::new(10), &opts).is_ok());
    token.cancel();
    assert_eq!(
        reflow(&input, &ReflowOptions::new(10), &opts),
        Err(Error::Cancelled { processed: 0 })
    );
}
