//! LaTeX clean-up rules for question text.
//!
//! Each [`Rule`] rewrites plain prose around inline math (`\( .. \)`) and
//! leaves text that is already inside a math span alone.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::exam::Module;

/// Words the geometric rule used to wrap as segment names by mistake.
pub const COMMON_WORDS: [&str; 30] = [
    "the", "with", "of", "one", "is", "has", "and", "a", "an", "in", "to", "for", "at", "by",
    "are", "was", "were", "have", "had", "will", "would", "can", "could", "it", "but", "on",
    "this", "that", "these", "those",
];

/// Text holding any of these looks like serialized structure, not prose;
/// the number rule leaves it untouched.
const STRUCTURAL_KEYWORDS: [&str; 18] = [
    "question_number",
    "correct_option",
    "version",
    "total_questions",
    "module_1_questions",
    "module_2_questions",
    "threshold",
    "duration_minutes",
    "coords",
    "xRange",
    "yRange",
    "tickStep",
    "through",
    "label",
    "position",
    "showGrid",
    "showAxes",
    "showTicks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Rule {
    /// `triangle ABC`, `side AB`, `rectangle ABCD` and friends
    GeometricNames,
    /// `\(\overline{the}\)` back to `the`
    CommonWords,
    /// `xy-plane` to `\(xy\)-plane`
    XyPlane,
    /// bare numbers to `\(12{,}000\)`
    Numbers,
    /// `\(\(75\)\)%` to `\(75\)%`
    Percentages,
}

impl Rule {
    /// Application order when every rule runs; later rules clean up after
    /// earlier ones.
    pub const ALL: [Rule; 5] = [
        Rule::GeometricNames,
        Rule::CommonWords,
        Rule::XyPlane,
        Rule::Numbers,
        Rule::Percentages,
    ];

    pub fn apply(&self, text: &str) -> String {
        match self {
            Rule::GeometricNames => geometric_names(text),
            Rule::CommonWords => common_words(text),
            Rule::XyPlane => xy_plane(text),
            Rule::Numbers => numbers(text),
            Rule::Percentages => percentages(text),
        }
    }

    /// Options are only rewritten by the number rule.
    fn touches_options(&self) -> bool {
        matches!(self, Rule::Numbers)
    }
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    // patterns are literals in this module, covered by the tests below
    cell.get_or_init(|| Regex::new(pattern).expect("text rule pattern is a valid regex"))
}

/// True when `pos` sits inside an open `\(` or `\[` span.
pub fn inside_math(text: &str, pos: usize) -> bool {
    let before = &text[..pos];
    let opens = before.matches("\\(").count() + before.matches("\\[").count();
    let closes = before.matches("\\)").count() + before.matches("\\]").count();
    opens > closes
}

/// Rewrites every match of `re` that starts outside math. `replace` returns
/// `None` to keep a match as it is.
fn replace_outside_math(
    text: &str,
    re: &Regex,
    replace: impl Fn(&Captures, &str) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if inside_math(text, whole.start()) {
            continue;
        }
        if let Some(replacement) = replace(&caps, text) {
            out.push_str(&text[last..whole.start()]);
            out.push_str(&replacement);
            last = whole.end();
        }
    }
    out.push_str(&text[last..]);
    out
}

fn percentages(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(
        &RE,
        r"\\\(\\\((\d+(?:(?:,|\{,\})\d{3})*(?:\.\d+)?)\\\)\\\)%",
    );
    re.replace_all(text, r"\(${1}\)%").into_owned()
}

fn xy_plane(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"\bxy-plane\b");
    replace_outside_math(text, re, |_, _| Some(String::from(r"\(xy\)-plane")))
}

fn common_words(text: &str) -> String {
    COMMON_WORDS.iter().fold(text.to_string(), |acc, word| {
        acc.replace(&format!("\\(\\overline{{{}}}\\)", word), word)
    })
}

fn numbers(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    if STRUCTURAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        return text.to_string();
    }
    let re = regex(&RE, r"\b(\d{1,3}(?:,\d{3})*(?:\.\d+)?|\d+\.\d+|\d+)\b");

    replace_outside_math(text, re, |caps, text| {
        let m = caps.get(0)?;
        let after = &text[m.end()..];
        if after.starts_with("\\)") || after.starts_with("\\]") {
            return None;
        }
        // numbers inside an unterminated \begin{..} environment stay put
        let before = &text[..m.start()];
        if let Some(env) = before.rfind("\\begin{") {
            if !before[env..].contains("\\end{") {
                return None;
            }
        }
        Some(format!("\\({}\\)", m.as_str().replace(',', "{,}")))
    })
}

fn geometric_names(text: &str) -> String {
    static TRIANGLE: OnceLock<Regex> = OnceLock::new();
    static NAMED: OnceLock<Regex> = OnceLock::new();
    static SIDE: OnceLock<Regex> = OnceLock::new();
    static MEASURE: OnceLock<Regex> = OnceLock::new();

    if text.contains("\\begin{") || (text.contains("\\[") && text.contains("\\]")) {
        return text.to_string();
    }

    let triangle = regex(&TRIANGLE, r"\btriangle ([A-Z]{2,})\b");
    let result = replace_outside_math(text, triangle, |caps, _| {
        Some(format!("\\(\\triangle {}\\)", &caps[1]))
    });

    let named = regex(&NAMED, r"\b(parallelogram|rectangle) ([A-Z]{2,})\b");
    let result = replace_outside_math(&result, named, |caps, _| {
        Some(format!("{} \\({}\\)", &caps[1], &caps[2]))
    });

    let side = regex(&SIDE, r"\bside ([A-Z]{2,})\b");
    let result = replace_outside_math(&result, side, |caps, _| {
        Some(format!("side \\(\\overline{{{}}}\\)", &caps[1]))
    });

    // segment names after a measurement, e.g. "length of AB."
    let measure = regex(
        &MEASURE,
        r"\b((?i:length of|width of|height of|perimeter of|area of))\s+([A-Z]{2,4})\b",
    );
    replace_outside_math(&result, measure, |caps, text| {
        let end = caps.get(0)?.end();
        let next = text[end..].chars().next();
        if !matches!(next, None | Some(',') | Some('.')) && !next.is_some_and(char::is_whitespace)
        {
            return None;
        }
        Some(format!("{} \\(\\overline{{{}}}\\)", &caps[1], &caps[2]))
    })
}

fn rewrite(slot: &mut Value, rules: &[Rule]) -> bool {
    let Value::String(text) = slot else {
        return false;
    };
    let updated = rules.iter().fold(text.clone(), |acc, rule| rule.apply(&acc));
    if updated == *text {
        return false;
    }
    *text = updated;
    true
}

/// Rewrites `question`, `hint`, every `solution` line and, for the number
/// rule, plain-text `options`. Returns whether anything changed.
pub fn normalize_question(question: &mut Value, rules: &[Rule]) -> bool {
    let Value::Object(fields) = question else {
        return false;
    };
    let mut changed = false;

    for field in ["question", "hint"] {
        if let Some(slot) = fields.get_mut(field) {
            changed |= rewrite(slot, rules);
        }
    }

    if let Some(Value::Array(lines)) = fields.get_mut("solution") {
        for line in lines {
            changed |= rewrite(line, rules);
        }
    }

    let option_rules: Vec<Rule> = rules.iter().copied().filter(Rule::touches_options).collect();
    if !option_rules.is_empty() {
        if let Some(Value::Object(options)) = fields.get_mut("options") {
            for value in options.values_mut() {
                // display math and arrays are left as authored
                let is_display = value
                    .as_str()
                    .is_some_and(|v| v.contains("\\[") || v.contains("\\begin{"));
                if !is_display {
                    changed |= rewrite(value, &option_rules);
                }
            }
        }
    }

    changed
}

/// Runs the rules over the three adaptive modules of an exam object and
/// returns how many questions changed. `questions[]` is not touched.
pub fn normalize_modules(exam: &mut serde_json::Map<String, Value>, rules: &[Rule]) -> usize {
    let mut changed = 0;
    for module in Module::ALL {
        if let Some(Value::Array(questions)) = exam.get_mut(module.field()) {
            changed += questions
                .iter_mut()
                .map(|q| normalize_question(q, rules))
                .filter(|touched| *touched)
                .count();
        }
    }
    changed
}
