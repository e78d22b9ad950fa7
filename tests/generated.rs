//! Generate-and-check: random trees are compiled and compared against a
//! direct interpretation of the tree.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use setregex::regexp::{parse, CharRange};
use setregex::{CompiledRegex, DotMatch, Flags, Node, Normalizer, Universe};

const MAX_DEPTH: usize = 3;

fn gen_char(rng: &mut StdRng) -> char {
    // mostly a small alphabet so that random inputs hit the patterns
    if rng.gen_ratio(1, 10) {
        char::from_u32(rng.gen_range(0x80..0x3000)).unwrap_or('z')
    } else {
        rng.gen_range('a'..='e')
    }
}

fn gen_leaf(rng: &mut StdRng) -> Node {
    match rng.gen_range(0..10) {
        0..=4 => Node::lit(rng.gen_range('a'..='e')),
        5..=6 => {
            let from = rng.gen_range('a'..='d');
            let to = rng.gen_range(from..='e');
            Node::range(from, to)
        }
        7..=8 => Node::CharSet(vec![
            CharRange::chars('a', 'a'),
            CharRange::chars(rng.gen_range('c'..='d'), 'e'),
        ]),
        _ => Node::Wildcard,
    }
}

/// A tree without lookarounds; `ops` allows the set operation nodes.
fn gen_tree(rng: &mut StdRng, depth: usize, ops: bool) -> Node {
    if depth >= MAX_DEPTH || rng.gen_ratio(1, 4) {
        return gen_leaf(rng);
    }
    let kinds = if ops { 8 } else { 5 };
    match rng.gen_range(0..kinds) {
        0 | 1 => {
            let n = rng.gen_range(0..4);
            Node::Juxt((0..n).map(|_| gen_tree(rng, depth + 1, ops)).collect())
        }
        2 => {
            let n = rng.gen_range(1..4);
            Node::Disj((0..n).map(|_| gen_tree(rng, depth + 1, ops)).collect())
        }
        3 => {
            let min = rng.gen_range(0..3);
            let max = if rng.gen_bool(0.5) {
                None
            } else {
                Some(rng.gen_range(min..min + 3))
            };
            Node::rep(min, max, gen_tree(rng, depth + 1, ops))
        }
        4 => Node::CaptureGroup(Box::new(gen_tree(rng, depth + 1, ops))),
        5 => Node::intersection(gen_tree(rng, depth + 1, ops), gen_tree(rng, depth + 1, ops)),
        6 => Node::union(gen_tree(rng, depth + 1, ops), gen_tree(rng, depth + 1, ops)),
        _ => Node::difference(gen_tree(rng, depth + 1, ops), gen_tree(rng, depth + 1, ops)),
    }
}

fn pick(rng: &mut StdRng, ranges: &[CharRange]) -> Option<char> {
    if ranges.is_empty() {
        return None;
    }
    let r = ranges[rng.gen_range(0..ranges.len())];
    char::from_u32(rng.gen_range(r.from..=r.to))
}

/// A string in the language of `node`, or `None` if the walk hit an empty
/// class. Only for trees without set operations.
fn gen_sample(node: &Node, rng: &mut StdRng, out: &mut String) -> Option<()> {
    match node {
        Node::Lit(c) => out.push(char::from_u32(*c)?),
        Node::Range(r) => out.push(pick(rng, &[*r])?),
        Node::CharSet(ranges) => out.push(pick(rng, ranges)?),
        Node::Wildcard => out.push(gen_char(rng)),
        Node::Juxt(values) => {
            for value in values {
                gen_sample(value, rng, out)?;
            }
        }
        Node::Disj(values) if values.is_empty() => return None,
        Node::Disj(values) => gen_sample(&values[rng.gen_range(0..values.len())], rng, out)?,
        Node::Rep { min, max, value } => {
            let upper = max.unwrap_or(min + 3);
            for _ in 0..rng.gen_range(*min..=upper) {
                gen_sample(value, rng, out)?;
            }
        }
        Node::CaptureGroup(value) => gen_sample(value, rng, out)?,
        other => panic!("no sampler for {:?}", other),
    }
    Some(())
}

/// End positions of the matches of `node` starting at `start`.
fn ends(node: &Node, input: &[u32], start: usize) -> BTreeSet<usize> {
    let single = |ok: &dyn Fn(u32) -> bool| -> BTreeSet<usize> {
        match input.get(start) {
            Some(&c) if ok(c) => BTreeSet::from([start + 1]),
            _ => BTreeSet::new(),
        }
    };
    match node {
        Node::Lit(l) => single(&|c| c == *l),
        Node::Range(r) => single(&|c| r.contains(c)),
        Node::CharSet(ranges) => single(&|c| ranges.iter().any(|r| r.contains(c))),
        Node::Wildcard => single(&|_| true),
        Node::Juxt(values) => values.iter().fold(BTreeSet::from([start]), |positions, value| {
            positions.iter().flat_map(|&p| ends(value, input, p)).collect()
        }),
        Node::Disj(values) => values.iter().flat_map(|v| ends(v, input, start)).collect(),
        Node::Rep { min, max, value } => {
            let limit = max.unwrap_or(min + input.len() as u32 + 1);
            let mut result = BTreeSet::new();
            let mut current = BTreeSet::from([start]);
            if *min == 0 {
                result.insert(start);
            }
            for k in 1..=limit {
                current = current.iter().flat_map(|&p| ends(value, input, p)).collect();
                if current.is_empty() {
                    break;
                }
                if k >= *min {
                    result.extend(current.iter().copied());
                }
            }
            result
        }
        Node::CaptureGroup(value) => ends(value, input, start),
        Node::Intersection(left, right) => {
            let right = ends(right, input, start);
            ends(left, input, start).intersection(&right).copied().collect()
        }
        Node::Union(left, right) => {
            let mut all = ends(left, input, start);
            all.extend(ends(right, input, start));
            all
        }
        Node::Difference(left, right) => {
            let right = ends(right, input, start);
            ends(left, input, start).difference(&right).copied().collect()
        }
        other => panic!("no interpretation for {:?}", other),
    }
}

fn reference_matches(node: &Node, input: &str) -> bool {
    let code_points: Vec<u32> = input.chars().map(|c| c as u32).collect();
    ends(node, &code_points, 0).contains(&code_points.len())
}

fn compile(tree: &Node) -> CompiledRegex {
    let universe = Universe::new([tree], Normalizer::None, false);
    CompiledRegex::compile(tree, &universe).unwrap()
}

#[test]
fn test_samples_are_matched() {
    let mut rng = StdRng::seed_from_u64(0x5e7);
    for _ in 0..300 {
        let tree = gen_tree(&mut rng, 0, false);
        let re = compile(&tree);
        for _ in 0..10 {
            let mut sample = String::new();
            if gen_sample(&tree, &mut rng, &mut sample).is_none() {
                break;
            }
            assert!(re.matches(&sample), "{} should match {:?}", tree, sample);
        }
    }
}

#[test]
fn test_agrees_with_interpretation() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let tree = gen_tree(&mut rng, 0, true);
        let re = compile(&tree);
        let min = re.minimize();
        for _ in 0..20 {
            let len = rng.gen_range(0..6);
            let input: String = (0..len).map(|_| gen_char(&mut rng)).collect();
            let expected = reference_matches(&tree, &input);
            assert_eq!(re.matches(&input), expected, "{} on {:?}", tree, input);
            assert_eq!(min.matches(&input), expected, "minimized {} on {:?}", tree, input);
        }
    }
}

#[test]
fn test_long_repetitions() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let min = rng.gen_range(0..40);
        let max = min + rng.gen_range(0..40);
        let tree = Node::rep(min, Some(max), Node::range('a', 'b'));
        let re = compile(&tree);
        let n = rng.gen_range(0..100);
        let input: String = (0..n).map(|_| rng.gen_range('a'..='b')).collect();
        assert_eq!(re.matches(&input), (min..=max).contains(&n), "{} on {} chars", tree, n);
    }
}

#[test]
fn test_long_literal() {
    let mut rng = StdRng::seed_from_u64(11);
    let text: String = (0..5_000).map(|_| gen_char(&mut rng)).collect();
    let re = compile(&Node::literal_str(&text));
    assert!(re.matches(&text));
    let mut shorter = text.clone();
    shorter.pop();
    assert!(!re.matches(&shorter));
}

#[test]
fn test_printed_trees_reparse() {
    let all = Flags {
        dot_match: DotMatch::All,
        ..Flags::default()
    };
    let mut rng = StdRng::seed_from_u64(0xd83d);
    for _ in 0..200 {
        let mut tree = gen_tree(&mut rng, 0, false);
        if rng.gen_ratio(1, 3) {
            tree = Node::Juxt(vec![tree, Node::Lit(0xD83D), Node::Lit(0xDE00)]);
        }
        let printed = tree.to_string();
        let reparsed = parse(&printed, all).unwrap().tree;
        let universe = Universe::new([&tree, &reparsed], Normalizer::None, false);
        let original = CompiledRegex::compile(&tree, &universe).unwrap();
        let reread = CompiledRegex::compile(&reparsed, &universe).unwrap();
        assert!(original.equiv(&reread).unwrap(), "{} reparsed as {}", tree, reparsed);
    }
}

#[test]
fn test_printed_surrogates_stay_apart() {
    let pair = Node::Juxt(vec![Node::Lit(0xD83D), Node::Lit(0xDE00)]);
    let reparsed = parse(&pair.to_string(), Flags::default()).unwrap().tree;
    let joined = Node::lit('\u{1F600}');
    let universe = Universe::new([&pair, &reparsed, &joined], Normalizer::None, false);
    let compile = |tree: &Node| CompiledRegex::compile(tree, &universe).unwrap();
    assert!(compile(&reparsed).equiv(&compile(&pair)).unwrap());
    assert!(!compile(&reparsed).do_intersect(&compile(&joined)).unwrap());
}
