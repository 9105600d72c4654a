//! Edit scripts: one editor command per line, replayed against an
//! [`AppContext`].

use std::io::Write;

use anyhow::{bail, Context, Result};
use tune_art_config::HexColor;
use tune_art_core::{pointer_label, AppContext, Cell, StageData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Paint {
        x: usize,
        y: usize,
        color: Option<HexColor>,
    },
    Erase {
        x: usize,
        y: usize,
    },
    Clear,
    Color(Option<HexColor>),
    Modifier(Option<String>),
    Flag(Option<u8>),
    Pointer {
        x: i32,
        y: i32,
        over: bool,
    },
    Undo,
    Redo,
    Print,
    Depth,
}

/// Parses one line. Blank lines and `//` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = match line.find("//") {
        Some(at) => &line[..at],
        None => line,
    };
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (name, args.as_slice()) {
        ("paint", [x, y]) => Command::Paint {
            x: number(x)?,
            y: number(y)?,
            color: None,
        },
        ("paint", [x, y, color]) => Command::Paint {
            x: number(x)?,
            y: number(y)?,
            color: Some(hex(color)?),
        },
        ("erase", [x, y]) => Command::Erase {
            x: number(x)?,
            y: number(y)?,
        },
        ("clear", []) => Command::Clear,
        ("color", ["none"]) => Command::Color(None),
        ("color", [color]) => Command::Color(Some(hex(color)?)),
        ("modifier", ["none"]) => Command::Modifier(None),
        ("modifier", [name]) => Command::Modifier(Some((*name).to_string())),
        ("flag", ["none"]) => Command::Flag(None),
        ("flag", [flag]) => Command::Flag(Some(number(flag)?)),
        ("pointer", [x, y]) => Command::Pointer {
            x: number(x)?,
            y: number(y)?,
            over: true,
        },
        ("pointer", [x, y, "out"]) => Command::Pointer {
            x: number(x)?,
            y: number(y)?,
            over: false,
        },
        ("undo", []) => Command::Undo,
        ("redo", []) => Command::Redo,
        ("print", []) => Command::Print,
        ("depth", []) => Command::Depth,
        (
            "paint" | "erase" | "clear" | "color" | "modifier" | "flag" | "pointer" | "undo"
            | "redo" | "print" | "depth",
            _,
        ) => bail!("Wrong arguments for '{name}'"),
        _ => bail!("Unknown command '{name}'"),
    };
    Ok(Some(command))
}

/// Parses a whole script into `(line number, command)` pairs.
///
/// # Errors
///
/// Fails on the first bad line, naming its 1-based line number.
pub fn parse_script(text: &str) -> Result<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if let Some(command) =
            parse_line(line).with_context(|| format!("Parse error on line {line_no}"))?
        {
            commands.push((line_no, command));
        }
    }
    Ok(commands)
}

/// Runs parsed commands in order, writing `print` and `depth` output to `out`.
///
/// # Errors
///
/// Stops at the first command that fails, naming its line number.
pub fn run(ctx: &AppContext, commands: &[(usize, Command)], out: &mut impl Write) -> Result<()> {
    for (line_no, command) in commands {
        execute(ctx, command, &mut *out)
            .with_context(|| format!("Line {line_no}: {command:?} failed"))?;
    }
    Ok(())
}

fn execute(ctx: &AppContext, command: &Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Paint { x, y, color } => ctx.paint(*x, *y, *color)?,
        Command::Erase { x, y } => ctx.stage.erase_cell(*x, *y)?,
        Command::Clear => ctx.stage.clear_stage_data()?,
        Command::Color(color) => ctx.stage_palette.set_primary_color(*color),
        Command::Modifier(modifier) => ctx.stage_palette.set_current_modifier(modifier.clone()),
        Command::Flag(flag) => ctx.stage_palette.set_current_flag(*flag),
        Command::Pointer { x, y, over } => ctx.move_pointer(*x, *y, *over),
        Command::Undo => {
            if !ctx.undo() {
                tracing::info!("Nothing to undo");
            }
        }
        Command::Redo => {
            if !ctx.redo() {
                tracing::info!("Nothing to redo");
            }
        }
        Command::Print => {
            write!(out, "{}", render(&ctx.stage.get_state()))?;
            writeln!(out, "pointer: {}", pointer_label(&ctx.pointer.get_state()))?;
        }
        Command::Depth => writeln!(
            out,
            "undo: {} redo: {}",
            ctx.history.undo_depth(),
            ctx.history.redo_depth()
        )?,
    }
    Ok(())
}

/// Text view of the grid: `.` empty, `#` painted, `*` carries a modifier.
pub fn render(stage: &StageData) -> String {
    let mut text = String::with_capacity((stage.width + 1) * stage.height);
    for row in stage.data.chunks(stage.width.max(1)) {
        for cell in row {
            text.push(match cell {
                Cell { modifier: Some(_), .. } => '*',
                c if *c == Cell::default() => '.',
                _ => '#',
            });
        }
        text.push('\n');
    }
    text
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("'{raw}' is not a valid number"))
}

fn hex(raw: &str) -> Result<HexColor> {
    HexColor::from_hex(raw).with_context(|| format!("'{raw}' is not a hex color"))
}
