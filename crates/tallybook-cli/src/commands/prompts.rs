//! Prompt library commands

use anyhow::{anyhow, Result};
use tallybook_core::prompts::{PromptId, PromptLibrary};

fn override_dir_label(library: &PromptLibrary) -> String {
    library
        .override_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(no data directory on this system)".to_string())
}

pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();

    println!();
    println!("📝 Advisory prompts");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:22} │ {:>7} │ {:10} │ {}", "Id", "Version", "Task", "Source");
    println!("   ───────────────────────┼─────────┼────────────┼──────────");

    for info in library.list() {
        let source = if info.has_override { "override" } else { "built-in" };
        println!(
            "   {:22} │ {:>7} │ {:10} │ {}",
            info.id, info.version, info.task_type, source
        );
    }

    println!();
    println!("   Overrides are read from {}", override_dir_label(&library));
    println!("   Save a file named <id>.md there to replace a built-in prompt.");
    println!("   The user section must keep the {{{{summary_json}}}} placeholder.");

    Ok(())
}

/// Print the effective prompt for `prompt_id`, split into its sections
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let id: PromptId = prompt_id.parse().map_err(|e: String| {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        anyhow!("{} (known prompts: {})", e, known.join(", "))
    })?;

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!();
    println!(
        "📝 {} v{} ({})",
        prompt.metadata.id, prompt.metadata.version, prompt.metadata.task_type
    );
    match &prompt.override_path {
        Some(path) if prompt.is_override => println!("   Overridden by {}", path.display()),
        _ => println!("   Built-in default"),
    }

    for (heading, section) in [
        ("System", prompt.system_section()),
        ("User", prompt.user_section()),
    ] {
        println!();
        println!("── {} ──", heading);
        println!("{}", section.unwrap_or("(missing)"));
    }

    Ok(())
}

pub fn cmd_prompts_path() -> Result<()> {
    let library = PromptLibrary::new();
    let Some(path) = library.override_dir() else {
        eprintln!("⚠️  No data directory is available, so prompt overrides are disabled.");
        return Ok(());
    };

    println!("{}", path.display());
    if !path.exists() {
        eprintln!("   (directory does not exist yet; create it to add overrides)");
    }

    Ok(())
}
