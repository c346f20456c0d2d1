use unire_compiler::{compile, compile_with, CompileError, CompileOptions, Error, Regex};
use unire_runtime::{Captures, ExecError, Executor, FastForward, Utf16, Utf8};

const PATTERNS: [&str; 6] = [
    "&abc&([def]|\\d)+&abc",
    "&b+&",
    "(&[ab]&)+c",
    "&a&|&b&x",
    "@{\\w&!\\d}+&[0-9]{2,4}&",
    "&(x|xy)&y?",
];

const INPUTS: [&str; 6] = [
    "abcddee0099ff44abc",
    "zzabbbc",
    "ababc abc",
    "xbx ax",
    "abc_12345 z09",
    "xxyy",
];

#[test]
fn should_compile_identical_programs_for_identical_patterns() {
    for (test_id, pattern) in PATTERNS.into_iter().enumerate() {
        assert_eq!((test_id, compile(pattern)), (test_id, compile(pattern)));
    }
}

#[test]
fn should_keep_group_spans_within_the_match_span() {
    for pattern in PATTERNS {
        let regex = Regex::new(pattern).expect("pattern should compile");

        for input in INPUTS {
            let captures = match regex.search_str(input) {
                Ok(Some(captures)) => captures,
                Ok(None) => continue,
                Err(e) => panic!("{:?} on {:?} failed: {}", pattern, input, e),
            };
            let (start, end) = captures.whole_span();

            for group in captures.groups().skip(1) {
                if let Some((group_start, group_end)) = group.span() {
                    assert!(
                        start <= group_start && group_start <= group_end && group_end <= end,
                        "{:?} on {:?}: group {:?} escapes match {:?}",
                        pattern,
                        input,
                        (group_start, group_end),
                        (start, end)
                    );
                }
            }
        }
    }
}

#[test]
fn should_span_the_whole_input_when_matching() {
    for pattern in PATTERNS {
        let regex = Regex::new(pattern).expect("pattern should compile");

        for input in INPUTS.iter().copied().chain(["abc", "b", "xx"]) {
            let captures = match regex.match_str(input) {
                Ok(Some(captures)) => captures,
                Ok(None) => continue,
                Err(e) => panic!("{:?} on {:?} failed: {}", pattern, input, e),
            };

            assert_eq!(
                (pattern, input, (0, input.len())),
                (pattern, input, captures.whole_span())
            );
        }
    }
}

#[test]
fn should_find_no_match_starting_before_the_search_result() {
    for pattern in PATTERNS {
        let regex = Regex::new(pattern).expect("pattern should compile");
        let from_start = Regex::new(&format!("^({})", pattern)).expect("pattern should compile");

        for input in INPUTS {
            let start = match regex.search_str(input) {
                Ok(Some(captures)) => captures.whole_span().0,
                Ok(None) => input.len() + 1,
                Err(e) => panic!("{:?} on {:?} failed: {}", pattern, input, e),
            };

            for (offset, _) in input.char_indices().filter(|&(offset, _)| offset < start) {
                let rest = &input[offset..];

                assert_eq!(
                    (pattern, input, offset, Ok(None)),
                    (pattern, input, offset, regex.match_str(rest))
                );
                assert_eq!(
                    (pattern, input, offset, Ok(None)),
                    (pattern, input, offset, from_start.search_str(rest))
                );
            }
        }
    }
}

#[test]
fn should_return_identical_results_when_reused() {
    let regex = Regex::new("&b+&").expect("pattern should compile");
    let first: Vec<Option<Captures>> = INPUTS
        .iter()
        .map(|input| regex.search_str(input).ok().flatten())
        .collect();

    for _ in 0..3 {
        let again: Vec<Option<Captures>> = INPUTS
            .iter()
            .map(|input| regex.search_str(input).ok().flatten())
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn should_share_a_compiled_regex_across_threads() {
    let regex = Regex::new("&[a-z]+&\\d").expect("pattern should compile");
    let input = "--abc1--";
    let expected = regex.search_str(input);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| regex.search_str(input)))
            .collect();

        for handle in handles {
            assert_eq!(Ok(expected.clone()), handle.join().map_err(|_| ()));
        }
    });
}

#[test]
fn should_not_change_results_when_fast_forwarding() {
    for pattern in ["abc", "[xy]z", "\\d+", "&q&"] {
        let program = compile(pattern).expect("pattern should compile");
        assert_ne!(FastForward::None, program.fast_forward(), "{:?}", pattern);
        let without = program.clone().with_fast_forward(FastForward::None);

        for input in ["", "abc", "zzzzabcz", "xxxyz7", "99q", "qqq"] {
            let units: Vec<u16> = input.encode_utf16().collect();

            assert_eq!(
                Executor::new(&without).run_search::<Utf8>(input.as_bytes()),
                Executor::new(&program).run_search::<Utf8>(input.as_bytes()),
                "{:?} on {:?}",
                pattern,
                input
            );
            assert_eq!(
                Executor::new(&without).run_search::<Utf16>(&units),
                Executor::new(&program).run_search::<Utf16>(&units),
                "{:?} on {:?}",
                pattern,
                input
            );
        }
    }
}

#[test]
fn should_bound_execution_by_the_work_limit() {
    let regex = Regex::new("(a|aa)*b").expect("pattern should compile");
    let input = "a".repeat(256);

    assert_eq!(Ok(None), regex.search_str(&input));
    assert_eq!(
        Err(ExecError::WorkLimitExceeded { limit: 100 }),
        regex
            .executor()
            .with_work_limit(100)
            .run_search::<Utf8>(input.as_bytes())
    );
}

#[test]
fn should_reject_patterns_beyond_compile_bounds() {
    let options = CompileOptions::new()
        .with_max_repetition(10)
        .with_max_program_len(64);

    assert_eq!(
        Err(Error::Compile(CompileError::RepetitionTooLarge { limit: 10 })),
        compile_with("a{11}", &options)
    );
    assert_eq!(
        Err(Error::Compile(CompileError::ProgramTooLarge { limit: 64 })),
        compile_with("(abcdefgh){10}", &options)
    );
    assert!(compile_with("(abcdefgh){2}", &options).is_ok());
}
