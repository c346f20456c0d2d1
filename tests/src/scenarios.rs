use pretty_assertions::assert_eq;
use unire_compiler::Regex;
use unire_runtime::{Captures, ExecError, SaveGroupSlot, Utf16, Utf32, Utf8};

fn span(res: Result<Option<Captures>, ExecError>) -> Option<(usize, usize)> {
    res.ok().flatten().map(|captures| captures.whole_span())
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("{:?} should compile: {}", pattern, e))
}

#[test]
fn should_agree_with_match_and_search_scenarios() {
    let input_output = vec![
        ("abc", "abc", true, Some((0, 3))),
        ("abc", "ac", false, None),
        ("ab.\\.c+", "abe.cc", true, Some((0, 6))),
        ("@{[a-p]&[h-t]&!k|[+*?]}+", "hi?jl+mn*op", true, Some((0, 11))),
        ("@{[a-p]&[h-t]&!k}+", "hijklmnop", false, Some((0, 3))),
        ("&b+&", "abbbc", false, Some((1, 4))),
        ("^mine", "abcminecraft", false, None),
        ("mine|craft", "minecraft", false, Some((0, 4))),
    ];

    for (test_id, (pattern, input, is_match, search)) in input_output.into_iter().enumerate() {
        let regex = regex(pattern);

        assert_eq!(
            (test_id, pattern, Ok(is_match)),
            (test_id, pattern, regex.is_match(input))
        );
        assert_eq!(
            (test_id, pattern, search),
            (test_id, pattern, span(regex.search_str(input)))
        );
    }
}

#[test]
fn should_capture_save_point_groups() {
    let input_output = vec![
        (
            "&abc&([def]|\\d)+&abc",
            "abcddee0099ff44abc",
            true,
            vec![
                SaveGroupSlot::complete(0, 18),
                SaveGroupSlot::complete(0, 3),
                SaveGroupSlot::complete(3, 15),
            ],
        ),
        (
            "&b+&",
            "abbbc",
            false,
            vec![SaveGroupSlot::complete(1, 4), SaveGroupSlot::complete(1, 4)],
        ),
        (
            // a repeated group reports its final iteration.
            "(&[ab]&)+",
            "ab",
            true,
            vec![SaveGroupSlot::complete(0, 2), SaveGroupSlot::complete(1, 2)],
        ),
        (
            // a lazy repetition stops after its first iteration.
            "&(&a&)+?&",
            "aaa",
            false,
            vec![
                SaveGroupSlot::complete(0, 1),
                SaveGroupSlot::complete(0, 1),
                SaveGroupSlot::complete(0, 1),
            ],
        ),
        (
            // and iterates only as often as the rest of the pattern needs.
            "(&a&)+?b",
            "aab",
            true,
            vec![SaveGroupSlot::complete(0, 3), SaveGroupSlot::complete(1, 2)],
        ),
        (
            "(&a&)+?",
            "aaa",
            false,
            vec![SaveGroupSlot::complete(0, 1), SaveGroupSlot::complete(0, 1)],
        ),
        (
            // an untaken alternative leaves its group absent.
            "&a&|&b&",
            "b",
            true,
            vec![
                SaveGroupSlot::complete(0, 1),
                SaveGroupSlot::None,
                SaveGroupSlot::complete(0, 1),
            ],
        ),
    ];

    for (test_id, (pattern, input, anchored, expected)) in input_output.into_iter().enumerate() {
        let regex = regex(pattern);
        let res = if anchored {
            regex.match_str(input)
        } else {
            regex.search_str(input)
        };
        let groups = res
            .ok()
            .flatten()
            .map(|captures| captures.groups().collect::<Vec<_>>());

        assert_eq!((test_id, Some(expected)), (test_id, groups));
    }
}

#[test]
fn should_handle_empty_patterns_and_inputs() {
    let input_output = vec![
        ("", "", Some((0, 0)), Some((0, 0))),
        ("", "xyz", None, Some((0, 0))),
        ("a*", "", Some((0, 0)), Some((0, 0))),
        ("a*", "bbb", None, Some((0, 0))),
        ("a?b", "", None, None),
        ("^$", "", Some((0, 0)), Some((0, 0))),
        ("$", "abc", None, Some((3, 3))),
    ];

    for (test_id, (pattern, input, matched, searched)) in input_output.into_iter().enumerate() {
        let regex = regex(pattern);

        assert_eq!(
            (test_id, matched, searched),
            (
                test_id,
                span(regex.match_str(input)),
                span(regex.search_str(input))
            )
        );
    }
}

#[test]
fn should_prefer_eager_or_lazy_quantifiers_as_written() {
    let input_output = vec![
        ("a+", "aaa", Some((0, 3))),
        ("a+?", "aaa", Some((0, 1))),
        ("a{2,3}", "aaaa", Some((0, 3))),
        ("a{2,3}?", "aaaa", Some((0, 2))),
        ("&a*?&b", "aab", Some((0, 3))),
        ("x(ab|a)", "xab", Some((0, 3))),
        ("x(a|ab)", "xab", Some((0, 2))),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!(
            (test_id, expected),
            (test_id, span(regex(pattern).search_str(input)))
        );
    }
}

#[test]
fn should_treat_builtin_classes_as_ascii_and_literals_as_unicode() {
    let input_output = vec![
        ("\\w+", "\u{e9}t\u{e9}", Some((2, 3))),
        ("\\W", "\u{e9}", Some((0, 2))),
        (".", "\u{1f600}", Some((0, 4))),
        ("[^a]+", "a\u{1f600}\u{e9}", Some((1, 7))),
        ("[\u{e0}-\u{ff}]", "x\u{e9}", Some((1, 3))),
        ("\\s\\h+", "id 0xFf", Some((2, 4))),
        ("\\u\\c+", "xAbcD", Some((1, 4))),
    ];

    for (test_id, (pattern, input, expected)) in input_output.into_iter().enumerate() {
        assert_eq!(
            (test_id, pattern, expected),
            (test_id, pattern, span(regex(pattern).search_str(input)))
        );
    }
}

#[test]
fn should_report_offsets_in_the_code_units_of_each_charset() {
    let regex = regex("&\u{1f600}+&b");
    let input = "a\u{1f600}\u{1f600}b";
    let utf16: Vec<u16> = input.encode_utf16().collect();
    let utf32: Vec<u32> = input.chars().map(u32::from).collect();

    let groups = |res: Result<Option<Captures>, ExecError>| {
        res.ok()
            .flatten()
            .map(|captures| captures.groups().collect::<Vec<_>>())
    };

    assert_eq!(
        Some(vec![
            SaveGroupSlot::complete(1, 10),
            SaveGroupSlot::complete(1, 9)
        ]),
        groups(regex.search_units::<Utf8>(input.as_bytes()))
    );
    assert_eq!(
        Some(vec![
            SaveGroupSlot::complete(1, 6),
            SaveGroupSlot::complete(1, 5)
        ]),
        groups(regex.search_units::<Utf16>(&utf16))
    );
    assert_eq!(
        Some(vec![
            SaveGroupSlot::complete(1, 4),
            SaveGroupSlot::complete(1, 3)
        ]),
        groups(regex.search_units::<Utf32>(&utf32))
    );
}

#[test]
fn should_decode_malformed_units_as_replacement_characters() {
    let any = regex(".");
    let replacement = regex("\u{fffd}");

    assert_eq!(Some((0, 1)), span(any.match_units::<Utf8>(&[0xff])));
    assert_eq!(Some((0, 1)), span(replacement.match_units::<Utf8>(&[0xff])));
    assert_eq!(Some((0, 1)), span(any.match_units::<Utf16>(&[0xd800])));
    assert_eq!(Some((0, 1)), span(any.match_units::<Utf32>(&[0x11_0000])));
    assert_eq!(
        Some((1, 2)),
        span(replacement.search_units::<Utf32>(&[u32::from('a'), 0xdfff]))
    );
}
