//! Command-line driver for the Nota note store.
//!
//! # Responsibility
//! - Map subcommands onto `nota_core` services over one workspace.
//! - Keep stdout deterministic: one note or path per line.

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Command, PageArgs};
use log::info;
use nota_core::model::note::Note;
use nota_core::{init_from_config, CoreConfig, Language, Page, Workspace};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.to_string_lossy().into_owned();
    }

    if let Err(err) = init_from_config(&config) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let workspace = Workspace::open(&config).context("failed to open note database")?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        nota_core::core_version()
    );

    match cli.command {
        Command::List { page } => {
            let notes = match to_page(page) {
                Some(page) => workspace.notes().list_notes_page(page)?,
                None => workspace.notes().list_notes()?,
            };
            print_rows(&notes);
        }
        Command::Search { query, page } => {
            let notes = match to_page(page) {
                Some(page) => workspace.notes().search_notes_page(&query, page)?,
                None => workspace.notes().search_notes(&query)?,
            };
            print_rows(&notes);
        }
        Command::Show { id } => print_note(&workspace.notes().get_note(&id)?),
        Command::Create { title, content } => {
            let created = workspace
                .notes()
                .create_note(&Note::draft(title, content))?;
            println!("{}", created.id);
        }
        Command::Update { id, title, content } => {
            let notes = workspace.notes();
            let mut note = notes.get_note(&id)?;
            if title.is_none() && content.is_none() {
                bail!("nothing to update: pass --title and/or --content");
            }
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = content {
                note.content = content;
            }
            let updated = notes.update_note(&note)?;
            println!("{}", updated.id);
        }
        Command::Delete { id } => workspace.notes().delete_note(&id)?,
        Command::Last => print_note(&workspace.notes().get_last_modified_note()?),
        Command::Export { dir, ids } => {
            let notes = if ids.is_empty() {
                workspace.notes().list_notes()?
            } else {
                ids.iter()
                    .map(|id| workspace.notes().get_note(id))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let report = workspace.transfer().export_notes(&notes, &dir)?;
            for path in &report.succeeded {
                println!("{}", path.display());
            }
            report_failures(&report.failures);
        }
        Command::ExportBundle { path } => {
            let notes = workspace.notes().list_notes()?;
            let written = workspace.transfer().export_bundle(&notes, &path)?;
            println!("{}", written.display());
        }
        Command::Import { dir, policy } => {
            let report = workspace
                .transfer()
                .import_notes(&dir, |_| policy.overwrite)?;
            print_rows(&report.succeeded);
            report_failures(&report.failures);
        }
        Command::ImportFile { path, policy } => {
            let note = workspace
                .transfer()
                .import_note(&path, |_| policy.overwrite)?;
            println!("{}", note.id);
        }
        Command::ImportBundle { path, policy } => {
            let report = workspace
                .transfer()
                .import_bundle(&path, |_| policy.overwrite)?;
            print_rows(&report.succeeded);
            report_failures(&report.failures);
        }
        Command::Language { code } => {
            let preferences = workspace.preferences();
            if let Some(code) = code {
                let Some(language) = Language::from_code(&code) else {
                    bail!("unknown language `{code}`; expected en|zh");
                };
                preferences.save_language(language)?;
            }
            println!("{}", preferences.language()?.code());
        }
    }

    Ok(())
}

fn to_page(args: PageArgs) -> Option<Page> {
    match args.limit {
        Some(limit) => Some(Page::new(args.offset, limit)),
        None if args.offset > 0 => Some(Page::new(args.offset, u32::MAX)),
        None => None,
    }
}

fn print_rows(notes: &[Note]) {
    for note in notes {
        println!(
            "{}\t{}\t{}",
            note.id,
            note.updated_at.format("%Y-%m-%d %H:%M:%S"),
            note.title
        );
    }
}

fn print_note(note: &Note) {
    println!("id: {}", note.id);
    println!("title: {}", note.title);
    println!("created: {}", note.created_at.to_rfc3339());
    println!("updated: {}", note.updated_at.to_rfc3339());
    if let Some(deleted_at) = note.deleted_at {
        println!("deleted: {}", deleted_at.to_rfc3339());
    }
    println!();
    println!("{}", note.content);
}

fn report_failures(failures: &[nota_core::BatchFailure]) {
    for failure in failures {
        eprintln!("skipped {}: {}", failure.item, failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::to_page;
    use crate::cli::{Cli, Command, PageArgs};
    use clap::{CommandFactory, Parser};
    use nota_core::Page;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_db_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["nota", "search", "apple", "--db", "/tmp/x.sqlite"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/x.sqlite")));
        assert!(matches!(cli.command, Command::Search { ref query, .. } if query == "apple"));
    }

    #[test]
    fn paging_is_optional() {
        assert_eq!(to_page(PageArgs { offset: 0, limit: None }), None);
        assert_eq!(
            to_page(PageArgs { offset: 2, limit: Some(5) }),
            Some(Page::new(2, 5))
        );
        assert_eq!(
            to_page(PageArgs { offset: 3, limit: None }),
            Some(Page::new(3, u32::MAX))
        );
    }
}
