// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! ROOMFORGE command line.
//!
//! Thin front end over the library: every command opens the saved
//! projects, performs one operation and waits for the save to finish.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roomforge::generation::HttpGenerator;
use roomforge::io::store::FileStore;
use roomforge::models::image::ImageData;
use roomforge::util::geometry::Point;
use roomforge::{App, AppConfig, SessionManager};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "roomforge", version, about = "Redesign rooms and exteriors with an image model")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a project from a photo
    New { image: PathBuf },
    /// Start a project from the bundled sample photo
    Sample,
    /// List saved projects, newest first
    List,
    /// Apply a prompt, with optional sketch overlay and product image
    Edit {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        sketch: Option<PathBuf>,
        #[arg(long)]
        product: Option<PathBuf>,
    },
    /// Place a product at a point given as fractions of the image, or as
    /// pixels when the display size is given
    Drop {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long)]
        product: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        /// Width and height of the display area, e.g. 800x450
        #[arg(long, value_parser = parse_display)]
        display: Option<(u32, u32)>,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Change only the background, environment and lighting
    Scenery {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long)]
        prompt: String,
    },
    /// Re-render the latest version from a rotated viewpoint
    Rotate {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long, allow_hyphen_values = true)]
        degrees: i32,
    },
    /// Drop every generated version
    Revert {
        #[arg(long)]
        project: Option<Uuid>,
    },
    Rename {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        name: String,
    },
    Delete {
        #[arg(long)]
        project: Uuid,
    },
    /// Write a version to a file (0 is the original, default is the latest)
    Export {
        #[arg(long)]
        project: Option<Uuid>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        version: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let store_dir = config.store_dir();
    let store = FileStore::open(&store_dir)
        .with_context(|| format!("Failed to open session store at {}", store_dir.display()))?;
    let session = SessionManager::open(Box::new(store), config.session_settings());

    run(cli.command, &config, session)
}

fn run(command: Command, config: &AppConfig, mut session: SessionManager) -> Result<()> {
    match command {
        Command::New { image } => {
            let scene = load_image(&image)?;
            let project = session.create_project(scene)?;
            println!("{}  {}", project.id(), project.name());
        }
        Command::Sample => {
            let project = session.start_from_sample(&config.sample_url, config.generator_timeout())?;
            println!("{}  {}", project.id(), project.name());
        }
        Command::List => {
            for project in session.projects() {
                let dims = project.original_dimensions();
                println!(
                    "{}  {:<20} {}x{}  {} version(s)  {}",
                    project.id(),
                    project.name(),
                    dims.width,
                    dims.height,
                    project.history().len(),
                    project.created_at().format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Edit {
            project,
            prompt,
            sketch,
            product,
        } => {
            open_project(&mut session, project)?;
            session.set_prompt(prompt);
            if let Some(path) = sketch {
                session.set_sketch_overlay(load_image(&path)?);
            }
            if let Some(path) = product {
                session.set_product_image(load_image(&path)?);
            }
            let mut app = build_app(config, session)?;
            app.submit_edit()?;
            session = app.into_session();
        }
        Command::Drop {
            project,
            product,
            x,
            y,
            display,
            prompt,
        } => {
            open_project(&mut session, project)?;
            session.set_product_image(load_image(&product)?);
            if let Some(prompt) = prompt {
                session.set_prompt(prompt);
            }
            let mut app = build_app(config, session)?;
            match display {
                Some((width, height)) => app.drop_product_at_pointer(Point::new(x, y), width, height)?,
                None => app.drop_product(Point::new(x, y))?,
            }
            session = app.into_session();
        }
        Command::Scenery { project, prompt } => {
            open_project(&mut session, project)?;
            let mut app = build_app(config, session)?;
            app.change_scenery(&prompt)?;
            session = app.into_session();
        }
        Command::Rotate { project, degrees } => {
            open_project(&mut session, project)?;
            let mut app = build_app(config, session)?;
            app.rotate_view(degrees)?;
            session = app.into_session();
        }
        Command::Revert { project } => {
            open_project(&mut session, project)?;
            session.revert_to_original()?;
        }
        Command::Rename { project, name } => {
            session.rename_project(project, name)?;
        }
        Command::Delete { project } => {
            session.delete_project(project)?;
        }
        Command::Export {
            project,
            out,
            version,
        } => {
            open_project(&mut session, project)?;
            let Some(active) = session.active_project() else {
                bail!("No project is open");
            };
            let image = match version {
                None => active.current_image(),
                Some(0) => active.original_image(),
                Some(n) => match active.history().generations().get(n - 1) {
                    Some(image) => image,
                    None => bail!(
                        "Version {} does not exist, project has {}",
                        n,
                        active.history().len()
                    ),
                },
            };
            image
                .write_to(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
    }

    session.wait_for_flush();
    Ok(())
}

fn build_app(config: &AppConfig, session: SessionManager) -> Result<App> {
    let generator = HttpGenerator::from_config(&config.generator)?;
    Ok(App::new(
        session,
        Box::new(generator),
        config.prompts.clone(),
        config.generation_settings(),
    ))
}

/// Open the given project, or the newest one when none is named.
fn open_project(session: &mut SessionManager, id: Option<Uuid>) -> Result<()> {
    let id = match id.or_else(|| session.projects().first().map(|p| p.id())) {
        Some(id) => id,
        None => bail!("No saved projects; start one with `roomforge new <image>`"),
    };
    session.select_project(id)?;
    Ok(())
}

fn load_image(path: &Path) -> Result<ImageData> {
    ImageData::from_path(path).with_context(|| format!("Failed to load image {}", path.display()))
}

fn parse_display(value: &str) -> std::result::Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {}", value))?;
    let width = width.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let height = height.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    Ok((width, height))
}
