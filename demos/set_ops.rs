//! Walk through set operations between patterns
//!
//! Run with: cargo run --example set_ops

use setregex::{compile_all, CompiledRegex, Flags};

fn show(label: &str, re: &CompiledRegex, inputs: &[&str]) {
    println!("{}: {}", label, re);
    for input in inputs {
        let report = re.match_and_report(input);
        println!(
            "  {:<12} matched={} consumed={}",
            format!("{:?}", input),
            report.matched,
            report.consumed
        );
    }
}

fn main() -> Result<(), setregex::Error> {
    let patterns = [
        r"[a-z]+",
        r"(?=.*[0-9]).+",
        r"[a-z]+[0-9]+",
        r"(?!admin).*",
    ];
    let group = compile_all(&patterns, Flags::default())?;
    let (letters, has_digit, word_num, not_admin) = (&group[0], &group[1], &group[2], &group[3]);

    let inputs = ["abc", "abc123", "admin1", "x9", ""];
    for re in &group {
        show("pattern", re, &inputs);
    }

    let accepted = word_num.intersect(not_admin)?;
    show("word+number, not admin", &accepted, &inputs);

    let either = letters.union(word_num)?.minimize();
    show("letters or word+number (minimized)", &either, &inputs);

    println!();
    println!("letters overlap has_digit: {}", letters.do_intersect(has_digit)?);
    println!("word_num within has_digit: {}", word_num.is_subset_of(has_digit)?);
    println!(
        "word_num strictly within has_digit: {}",
        word_num.is_proper_subset_of(has_digit)?
    );
    println!(
        "accepted is a proper subset of word_num: {}",
        accepted.is_proper_subset_of(word_num)?
    );
    println!("letters minus letters is empty: {}", !letters.diff(letters)?.matches_at_least_one());
    Ok(())
}
