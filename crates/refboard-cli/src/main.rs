//! `refboard`: inspect and edit board files without a window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand, ValueEnum};
use kurbo::Point;
use refboard_core::storage::{read_board_file, write_board_file};
use refboard_core::{
    BackgroundRemovalWorker, Board, BoardSettings, Canvas, ColorKeyRemover, EntityId, FileStorage,
    LayerMove, Storage,
};

#[derive(Parser, Debug)]
#[command(name = "refboard", version, about = "Edit RefBoard .sref files")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty board.
    New {
        board: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Import image files, cascading from a world point.
    Add {
        board: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// World point of the first image (default: origin).
        #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
        at: Option<Vec<f64>>,
    },
    /// List the images on a board, back to front.
    Info { board: PathBuf },
    /// Change the stacking order of one image.
    Layer {
        board: PathBuf,
        /// Image index as shown by `info`.
        index: usize,
        #[arg(value_enum)]
        to: LayerArg,
    },
    /// Multiply the scale of one image.
    Scale {
        board: PathBuf,
        index: usize,
        factor: f64,
    },
    /// Rotate one image by a number of degrees.
    Rotate {
        board: PathBuf,
        index: usize,
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Remove images by index.
    Remove {
        board: PathBuf,
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// Key out the border color of one image.
    RemoveBg {
        board: PathBuf,
        index: usize,
        #[arg(long, default_value_t = 24)]
        tolerance: u8,
        #[arg(long, default_value_t = 16)]
        softness: u8,
        /// Give up after this many seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// List the boards kept in the board library.
    Boards {
        /// Library directory (default: the platform data directory).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Copy a board file into the library under a name.
    Store {
        board: PathBuf,
        name: String,
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Replace a library board of the same name.
        #[arg(long)]
        force: bool,
    },
    /// Copy a library board out to a file.
    Fetch {
        name: String,
        board: PathBuf,
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Delete a board from the library.
    Discard {
        name: String,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Show the board settings, optionally changing the grid size.
    Settings {
        #[arg(long)]
        grid_size: Option<u32>,
        /// Restore the default settings.
        #[arg(long, conflicts_with = "grid_size")]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayerArg {
    Front,
    Back,
    Forward,
    Backward,
}

impl From<LayerArg> for LayerMove {
    fn from(arg: LayerArg) -> Self {
        match arg {
            LayerArg::Front => LayerMove::ToFront,
            LayerArg::Back => LayerMove::ToBack,
            LayerArg::Forward => LayerMove::Forward,
            LayerArg::Backward => LayerMove::Backward,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("{:?}", cli.cmd);
    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Command::New { board, force } => cmd_new(&board, force),
        Command::Add { board, files, at } => cmd_add(&board, &files, at),
        Command::Info { board } => cmd_info(&board),
        Command::Layer { board, index, to } => cmd_layer(&board, index, to.into()),
        Command::Scale { board, index, factor } => cmd_scale(&board, index, factor),
        Command::Rotate { board, index, degrees } => cmd_rotate(&board, index, degrees),
        Command::Remove { board, indices } => cmd_remove(&board, &indices),
        Command::RemoveBg {
            board,
            index,
            tolerance,
            softness,
            timeout,
        } => cmd_remove_bg(&board, index, ColorKeyRemover { tolerance, softness }, timeout),
        Command::Boards { dir } => cmd_boards(dir),
        Command::Store {
            board,
            name,
            dir,
            force,
        } => cmd_store(&board, &name, dir, force),
        Command::Fetch {
            name,
            board,
            dir,
            force,
        } => cmd_fetch(&name, &board, dir, force),
        Command::Discard { name, dir } => cmd_discard(&name, dir),
        Command::Settings { grid_size, reset } => cmd_settings(grid_size, reset),
    }
}

fn library(dir: Option<PathBuf>) -> anyhow::Result<FileStorage> {
    let storage = match dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    };
    storage.context("open board library")
}

fn open(path: &Path) -> anyhow::Result<Canvas> {
    let board = read_board_file(path).with_context(|| format!("open board '{}'", path.display()))?;
    let mut canvas = Canvas::new();
    canvas.load_board(board);
    Ok(canvas)
}

fn save(path: &Path, board: &Board) -> anyhow::Result<()> {
    write_board_file(path, board).with_context(|| format!("save board '{}'", path.display()))
}

fn entity_at(canvas: &Canvas, index: usize) -> anyhow::Result<EntityId> {
    match canvas.board().entities().get(index) {
        Some(entity) => Ok(entity.id()),
        None => bail!(
            "no image at index {} (board has {})",
            index,
            canvas.board().len()
        ),
    }
}

fn cmd_new(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    save(path, &Board::new())?;
    eprintln!("created {}", path.display());
    Ok(())
}

fn cmd_add(path: &Path, files: &[PathBuf], at: Option<Vec<f64>>) -> anyhow::Result<()> {
    let mut canvas = open(path)?;
    let origin = match at.as_deref() {
        Some([x, y]) => Point::new(*x, *y),
        _ => Point::ZERO,
    };

    let results = canvas.import_files(files, Some(origin));
    let mut added = 0;
    for (file, result) in files.iter().zip(&results) {
        match result {
            Ok(_) => added += 1,
            Err(e) => eprintln!("skipped {}: {}", file.display(), e),
        }
    }
    if added == 0 {
        bail!("no images imported");
    }
    save(path, canvas.board())?;
    eprintln!("added {} of {} images", added, files.len());
    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let board = read_board_file(path).with_context(|| format!("open board '{}'", path.display()))?;
    println!("{} (version {}, {} images)", path.display(), board.version, board.len());
    for (i, entity) in board.iter().enumerate() {
        let size = entity.native_size();
        let format = entity
            .format()
            .map(|f| f.mime_type())
            .unwrap_or("unknown");
        println!(
            "{:>4}  {:>6}x{:<6} {:<11} at ({:.1}, {:.1})  scale {:.3}  rotation {:.1}{}",
            i,
            size.width,
            size.height,
            format,
            entity.position.x,
            entity.position.y,
            entity.scale,
            entity.rotation,
            if entity.is_renderable() { "" } else { "  [undecodable]" },
        );
    }
    if let Some(bounds) = board.content_bounds() {
        println!(
            "bounds: ({:.1}, {:.1}) - ({:.1}, {:.1})",
            bounds.x0, bounds.y0, bounds.x1, bounds.y1
        );
    }
    Ok(())
}

fn cmd_layer(path: &Path, index: usize, layer_move: LayerMove) -> anyhow::Result<()> {
    let mut canvas = open(path)?;
    let id = entity_at(&canvas, index)?;
    if !canvas.move_layer(id, layer_move) {
        eprintln!("image {} is already there", index);
        return Ok(());
    }
    save(path, canvas.board())
}

fn cmd_scale(path: &Path, index: usize, factor: f64) -> anyhow::Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        bail!("scale factor must be positive, got {}", factor);
    }
    let mut canvas = open(path)?;
    let id = entity_at(&canvas, index)?;
    canvas.select(id);
    canvas.scale_selected(factor);
    save(path, canvas.board())
}

fn cmd_rotate(path: &Path, index: usize, degrees: f64) -> anyhow::Result<()> {
    if !degrees.is_finite() {
        bail!("rotation must be a finite number of degrees");
    }
    let mut canvas = open(path)?;
    let id = entity_at(&canvas, index)?;
    canvas.begin_touch(id);
    canvas.rotate(degrees);
    canvas.end_gesture();
    save(path, canvas.board())
}

fn cmd_remove(path: &Path, indices: &[usize]) -> anyhow::Result<()> {
    let mut canvas = open(path)?;
    let ids = indices
        .iter()
        .map(|&i| entity_at(&canvas, i))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let removed = ids.into_iter().filter(|&id| canvas.remove_entity(id)).count();
    save(path, canvas.board())?;
    eprintln!("removed {} images", removed);
    Ok(())
}

fn cmd_remove_bg(
    path: &Path,
    index: usize,
    remover: ColorKeyRemover,
    timeout: u64,
) -> anyhow::Result<()> {
    let mut canvas = open(path)?;
    let id = entity_at(&canvas, index)?;

    let mut worker = BackgroundRemovalWorker::spawn(remover).context("start worker")?;
    canvas
        .request_background_removal(&mut worker, id)
        .with_context(|| format!("queue image {}", index))?;

    let Some(outcome) = worker.wait(Duration::from_secs(timeout)) else {
        bail!("background removal timed out after {}s", timeout);
    };
    if let Err(e) = &outcome.result {
        bail!("background removal failed: {}", e);
    }
    if !canvas.apply_background_removal(outcome) {
        bail!("background removal returned an unusable image");
    }
    save(path, canvas.board())
}

fn cmd_boards(dir: Option<PathBuf>) -> anyhow::Result<()> {
    let storage = library(dir)?;
    for name in pollster::block_on(storage.list()).context("list boards")? {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_store(path: &Path, name: &str, dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let storage = library(dir)?;
    if !force && pollster::block_on(storage.exists(name))? {
        bail!("library already has a board named '{}' (use --force to replace)", name);
    }
    let board = read_board_file(path).with_context(|| format!("open board '{}'", path.display()))?;
    pollster::block_on(storage.save(name, &board)).with_context(|| format!("store '{}'", name))?;
    eprintln!("stored {} as '{}'", path.display(), name);
    Ok(())
}

fn cmd_fetch(name: &str, path: &Path, dir: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    let storage = library(dir)?;
    let board = pollster::block_on(storage.load(name)).with_context(|| format!("fetch '{}'", name))?;
    save(path, &board)?;
    eprintln!("fetched '{}' to {}", name, path.display());
    Ok(())
}

fn cmd_discard(name: &str, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let storage = library(dir)?;
    if !pollster::block_on(storage.exists(name))? {
        bail!("no board named '{}'", name);
    }
    pollster::block_on(storage.delete(name)).with_context(|| format!("discard '{}'", name))?;
    Ok(())
}

fn cmd_settings(grid_size: Option<u32>, reset: bool) -> anyhow::Result<()> {
    let mut settings = BoardSettings::load_or_default();
    if reset || grid_size.is_some() {
        if reset {
            settings.reset_defaults();
        }
        if let Some(size) = grid_size {
            settings.set_grid_size(size);
        }
        settings.save_default().context("save settings")?;
    }
    println!("{:#?}", settings);
    Ok(())
}
