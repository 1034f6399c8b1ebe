#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

pub fn question(n: usize) -> Value {
    json!({
        "question_number": n,
        "topic": "Algebra",
        "subskill": "Linear equations in one variable",
        "difficulty": "medium",
        "question": format!("Question {}", n),
        "options": { "A": "1", "B": "2", "C": "3", "D": "4" },
        "correct_option": "B",
        "format": "multiple_choice"
    })
}

pub fn questions(n: usize) -> Value {
    Value::Array((1..=n).map(question).collect())
}

pub fn adaptive_exam(exam_id: &str) -> Value {
    json!({
        "exam_id": exam_id,
        "name": format!("SAT {}", exam_id),
        "is_active": true,
        "is_adaptive": true,
        "metadata": { "total_questions": 44, "duration_minutes": 64, "threshold": 16 },
        "module_1": questions(22),
        "module_2_easy": questions(22),
        "module_2_hard": questions(22)
    })
}

pub fn fixed_exam(exam_id: &str) -> Value {
    json!({
        "exam_id": exam_id,
        "name": format!("SAT {}", exam_id),
        "is_active": true,
        "difficulty_level": "medium",
        "metadata": { "total_questions": 44, "duration_minutes": 134 },
        "questions": questions(44)
    })
}

pub fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}
