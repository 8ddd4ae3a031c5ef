use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use rsvp_server::{seed, RsvpServer, ServerConfig};
use rsvp_store::{InviteStore, RedbInviteStore};
use rsvp_types::InviteMap;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Seed(args) => cmd_seed(args),
        Command::Dump(args) => cmd_dump(args, &cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(args.config.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(RsvpServer::new(config).serve())?;
    Ok(())
}

fn cmd_seed(args: SeedArgs) -> anyhow::Result<()> {
    if !args.file.exists() {
        bail!("seed file {} does not exist", args.file.display());
    }
    let store = open(&args.db)?;
    let before = store.get_all_invites()?.len();
    seed::load_from_file(&args.file, &store)?;
    let after = store.get_all_invites()?.len();
    store.close()?;

    println!(
        "{} Seeded {} new invites into {} ({} total)",
        "✓".green().bold(),
        (after - before).to_string().bold(),
        args.db.display(),
        after
    );
    Ok(())
}

fn cmd_dump(args: DumpArgs, format: &OutputFormat) -> anyhow::Result<()> {
    if !args.db.exists() {
        bail!("database {} does not exist", args.db.display());
    }
    let store = open(&args.db)?;
    let invites = store.get_all_invites()?;
    store.close()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&invites)?),
        OutputFormat::Text => print!("{}", render_text(&invites)),
    }
    Ok(())
}

fn open(db: &Path) -> anyhow::Result<RedbInviteStore> {
    RedbInviteStore::open(db).with_context(|| format!("opening {}", db.display()))
}

fn render_text(invites: &InviteMap) -> String {
    let mut out = String::new();
    if invites.is_empty() {
        out.push_str("No invites.\n");
        return out;
    }
    for (id, record) in invites {
        let status = if record.accepted {
            "accepted".green()
        } else if record.is_opened() {
            "opened".yellow()
        } else {
            "pending".dimmed()
        };
        let _ = writeln!(out, "{}  {}", id.yellow().bold(), status);
        let _ = writeln!(out, "  People: {}", record.people.join(", "));
        let _ = writeln!(
            out,
            "  Guests: {}/{}",
            record.additional.len(),
            record.additional_count
        );
        if !record.additional.is_empty() {
            let _ = writeln!(out, "  Additional: {}", record.additional.join(", "));
        }
        let _ = writeln!(out, "  Views: {}", record.viewed_at.len());
        if let Some(at) = record.accepted_at {
            let _ = writeln!(out, "  Accepted at: {}", at.to_rfc3339());
        }
    }
    let accepted = invites.values().filter(|r| r.accepted).count();
    let _ = writeln!(out, "\n{} invites, {} accepted", invites.len(), accepted);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsvp_types::InviteRecord;

    const SEED: &str = r#"{"invites": {
        "aaaa0000-0000-0000-0000-000000000001": {"people": ["Иван Петров"], "additional_count": 2}
    }}"#;

    #[test]
    fn render_empty() {
        colored::control::set_override(false);
        assert_eq!(render_text(&InviteMap::new()), "No invites.\n");
    }

    #[test]
    fn render_lists_records() {
        colored::control::set_override(false);
        let mut invites = InviteMap::new();
        let mut record = InviteRecord::new(vec!["Иван Петров".into()], 2);
        record.accept(vec!["Анна".into()], chrono::Utc::now()).unwrap();
        invites.insert("id-1".into(), record);
        invites.insert("id-2".into(), InviteRecord::new(vec!["Олег".into()], 0));

        let text = render_text(&invites);
        assert!(text.contains("id-1  accepted"));
        assert!(text.contains("id-2  pending"));
        assert!(text.contains("Guests: 1/2"));
        assert!(text.contains("Additional: Анна"));
        assert!(text.contains("2 invites, 1 accepted"));
    }

    #[test]
    fn seed_then_dump() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("rsvp.redb");
        let file = dir.path().join("seed.json");
        std::fs::write(&file, SEED).unwrap();

        cmd_seed(SeedArgs {
            db: db.clone(),
            file: file.clone(),
        })
        .unwrap();
        // Second run keeps existing ids.
        cmd_seed(SeedArgs {
            db: db.clone(),
            file,
        })
        .unwrap();

        let store = RedbInviteStore::open(&db).unwrap();
        assert_eq!(store.get_all_invites().unwrap().len(), 1);
        store.close().unwrap();

        cmd_dump(DumpArgs { db }, &OutputFormat::Json).unwrap();
    }

    #[test]
    fn seed_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_seed(SeedArgs {
            db: dir.path().join("rsvp.redb"),
            file: dir.path().join("missing.json"),
        })
        .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn dump_missing_db_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_dump(
            DumpArgs {
                db: dir.path().join("none.redb")
            },
            &OutputFormat::Text
        )
        .is_err());
    }
}
