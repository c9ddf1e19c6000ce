//! The `examkit segment` command.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::passage::segment;

pub fn execute(passage_path: PathBuf) -> Result<()> {
    let text = super::read_input(&passage_path)?;
    let paragraphs = segment(&text);

    if paragraphs.is_empty() {
        println!("Empty passage.");
        return Ok(());
    }

    for paragraph in &paragraphs {
        match paragraph.anchor {
            Some(anchor) => println!("[{anchor}] {}", paragraph.text),
            None => println!("    {}", paragraph.text),
        }
    }
    println!("\n{} paragraph(s)", paragraphs.len());

    Ok(())
}
