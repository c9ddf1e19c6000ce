//! The `examkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examkit.toml").exists() {
        println!("examkit.toml already exists, skipping.");
    } else {
        std::fs::write("examkit.toml", SAMPLE_CONFIG)?;
        println!("Created examkit.toml");
    }

    std::fs::create_dir_all("exams")?;
    let sample_path = std::path::Path::new("exams/sample.json");
    if sample_path.exists() {
        println!("exams/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_EXAM)?;
        println!("Created exams/sample.json");
    }

    let script_path = std::path::Path::new("exams/sample-script.jsonl");
    if script_path.exists() {
        println!("exams/sample-script.jsonl already exists, skipping.");
    } else {
        std::fs::write(script_path, SAMPLE_SCRIPT)?;
        println!("Created exams/sample-script.jsonl");
    }

    println!("\nNext steps:");
    println!("  1. Edit examkit.toml with your exam service URL");
    println!("  2. Run: examkit validate --exam exams/sample.json");
    println!("  3. Run: examkit take sample --offline exams/sample.json --script exams/sample-script.jsonl");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkit configuration

base_url = "https://exams.example.com/api"
# Bearer token for authenticated sessions; ticket links (?sid=...) work without one.
token = "${EXAMKIT_TOKEN}"
timeout_secs = 30
tick_interval_ms = 1000
"#;

const SAMPLE_EXAM: &str = include_str!("../../../../exams/sample.json");

const SAMPLE_SCRIPT: &str = include_str!("../../../../exams/sample-script.jsonl");
