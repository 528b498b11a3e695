//! The `groundquiz learn` command: explain, quiz, grade, reteach.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use groundquiz_core::session::{AttemptRecord, SessionRecord};
use groundquiz_core::tutor::{grade, AttemptVerdict, Tutor};
use groundquiz_core::{Quiz, QuizGrounder};

use super::{print_question, GlobalOpts};

pub async fn execute(opts: &GlobalOpts, topic: String, output: PathBuf) -> Result<()> {
    let topic = topic.trim().to_string();
    anyhow::ensure!(!topic.is_empty(), "topic must not be empty");

    let (config, oracle) = opts.load()?;
    let tutor = Tutor::new(oracle.clone(), config.tutor_config());
    let grounder = QuizGrounder::new(oracle, config.grounder_config());
    let policy = config.mastery_policy();

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut session = SessionRecord::new(&topic);

    let mut source = tutor.explain(&topic).await?;
    println!("=== {topic} ===\n\n{source}\n");

    let mut attempt = 1;
    loop {
        let difficulty = policy.difficulty_for(attempt);
        let generated = grounder.generate_quiz(&topic, &source, difficulty).await?;
        println!(
            "--- Attempt {attempt}/{} ({difficulty}, relevance {}) ---\n",
            policy.max_attempts, generated.relevance
        );

        let answers = ask_quiz(&generated.quiz, &mut input)?;
        let result = grade(&generated.quiz, &answers)?;
        let verdict = policy.evaluate(attempt, result.percent)?;
        println!(
            "Score: {}/{} ({}%)\n",
            result.correct, result.total, result.percent
        );

        session.record(AttemptRecord {
            attempt_number: attempt,
            difficulty,
            origin: generated.quiz.origin(),
            relevance: generated.relevance,
            grade: result,
            verdict,
            recorded_at: chrono::Utc::now(),
        });

        match verdict {
            AttemptVerdict::Mastered => {
                println!("Mastered! You reached the {}% threshold.", policy.threshold_percent);
                break;
            }
            AttemptVerdict::Exhausted => {
                println!(
                    "Not mastered after {} attempts. Review the material and try again later.",
                    policy.max_attempts
                );
                break;
            }
            AttemptVerdict::Retry { next_attempt, .. } => {
                source = tutor.reteach(&topic).await?;
                println!("Let's try a simpler explanation.\n\n{source}\n");
                attempt = next_attempt;
            }
        }
    }

    print_history(&session);

    let path = output.join(format!("session-{}.json", session.id));
    session.save_json(&path)?;
    eprintln!("Session saved to: {}", path.display());
    Ok(())
}

/// Show every question and collect one answer (1-4) per question.
fn ask_quiz(quiz: &Quiz, input: &mut impl BufRead) -> Result<Vec<u8>> {
    let mut answers = Vec::with_capacity(quiz.questions().len());
    for (i, question) in quiz.questions().iter().enumerate() {
        print_question(i + 1, question);
        answers.push(read_answer(input)?);
        println!();
    }
    Ok(answers)
}

/// Prompt until a valid option number arrives. Returns a 0-based index.
fn read_answer(input: &mut impl BufRead) -> Result<u8> {
    loop {
        print!("Your answer (1-4): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            anyhow::bail!("input ended before the quiz was finished");
        }
        match parse_answer(&line) {
            Some(index) => return Ok(index),
            None => println!("Please enter a number from 1 to 4."),
        }
    }
}

fn parse_answer(line: &str) -> Option<u8> {
    match line.trim().parse::<u8>() {
        Ok(n @ 1..=4) => Some(n - 1),
        _ => None,
    }
}

fn print_history(session: &SessionRecord) {
    let mut table = Table::new();
    table.set_header(vec![
        "Attempt",
        "Difficulty",
        "Quiz",
        "Relevance",
        "Score",
        "Verdict",
    ]);

    for attempt in &session.attempts {
        let verdict = match attempt.verdict {
            AttemptVerdict::Mastered => "mastered",
            AttemptVerdict::Retry { .. } => "retry",
            AttemptVerdict::Exhausted => "exhausted",
        };
        table.add_row(vec![
            Cell::new(attempt.attempt_number),
            Cell::new(attempt.difficulty),
            Cell::new(attempt.origin),
            Cell::new(attempt.relevance),
            Cell::new(format!("{}%", attempt.grade.percent)),
            Cell::new(verdict),
        ]);
    }

    println!("\n{table}");
}
