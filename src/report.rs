use crate::algos::Policy;
use crate::envs::cell::{Action, Cell, CellKind};
use crate::envs::grid_world::{GridWorld, Position};
use crate::error::{Error, Result};
use itertools::Itertools;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const VALUE_WIDTH: usize = 7;

/// Fixed-width rendering of a cell's current value: the shortest
/// representation, cut (not rounded) to the column width.
pub fn str_value(cell: &Cell) -> String {
    match cell.value() {
        Some(v) => format!("{:>w$.w$}", format!("{v:?}"), w = VALUE_WIDTH),
        None => "x".repeat(VALUE_WIDTH),
    }
}

pub fn str_policy(action: Option<Action>) -> char {
    action.map_or('x', Action::symbol)
}

/// Rows of the board, top (`max_y`) first.
fn rows_top_down(world: &GridWorld) -> impl Iterator<Item = Vec<&Cell>> {
    (0..world.height()).rev().map(move |y| {
        (0..world.width())
            .map(move |x| &world[Position::new(x, y)])
            .collect()
    })
}

fn separator(world: &GridWorld) -> String {
    format!("{}-\n", "-".repeat((VALUE_WIDTH + 1) * world.width()))
}

/// Value grid, top row first. Forbidden cells show as `xxxxxxx`.
pub fn render_values(world: &GridWorld) -> String {
    let mut out = separator(world);
    for row in rows_top_down(world) {
        out.push_str(&format!("|{}|\n", row.iter().map(|c| str_value(c)).join("|")));
        out.push_str(&separator(world));
    }
    out
}

/// One symbol per cell, top row first, `x` where the policy has no action.
pub fn render_policy(world: &GridWorld, policy: &dyn Policy) -> String {
    rows_top_down(world)
        .map(|row| {
            row.iter()
                .map(|c| str_policy(policy.policy(Position::new(c.x(), c.y()))))
                .join(" ")
        })
        .join("\n")
}

/// Per board row: one line per action with its value, then the greedy action.
pub fn render_q_table(world: &GridWorld, policy: &dyn Policy) -> String {
    let mut out = separator(world);
    for row in rows_top_down(world) {
        for a in Action::ALL {
            let line = row
                .iter()
                .map(|c| format!("{}{:>6.3}", a.symbol(), c.action_value(a)))
                .join("|");
            out.push_str(&format!("|{line}|\n"));
        }
        let line = row
            .iter()
            .map(|c| {
                let a = policy.policy(Position::new(c.x(), c.y()));
                format!("   {}   ", str_policy(a))
            })
            .join("|");
        out.push_str(&format!("|{line}|\n"));
        out.push_str(&separator(world));
    }
    out
}

/// Writes the value-iteration history as a whitespace-delimited table.
///
/// Columns are the iteration index followed by every non-forbidden cell in
/// board-scan order, labelled 1-based as `(x+1,y+1)`. Terminal columns hold
/// their fixed reward. Histories shorter than the longest one are aligned on
/// their latest entry and padded with their first.
pub fn write_value_history<W: Write>(world: &GridWorld, mut out: W) -> io::Result<()> {
    let cells = world
        .all_fields()
        .filter(|c| c.kind() != CellKind::Forbidden)
        .collect::<Vec<_>>();
    let rows = cells
        .iter()
        .map(|c| c.value_history().len())
        .max()
        .unwrap_or(0);

    writeln!(
        out,
        "iteration {}",
        cells
            .iter()
            .map(|c| format!("({},{})", c.x() + 1, c.y() + 1))
            .join(" ")
    )?;

    for i in 0..rows {
        let values = cells.iter().map(|c| {
            if c.is_terminal() {
                return c.reward().unwrap_or_default();
            }
            let h = c.value_history();
            let offset = rows - h.len();
            h.get(i.saturating_sub(offset))
                .copied()
                .unwrap_or(f64::NAN)
        });
        writeln!(out, "{i} {}", values.map(|v| v.to_string()).join(" "))?;
    }

    out.flush()
}

pub fn save_value_history(world: &GridWorld, path: &Path) -> Result<()> {
    let to_err = |e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(to_err)?;
    write_value_history(world, BufWriter::new(file)).map_err(to_err)
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CellSummary {
    pub position: Position,
    pub kind: CellKind,
    pub reward: Option<f64>,
    pub value: Option<f64>,
    pub policy: Option<Action>,
    pub action_values: [f64; 4],
    pub action_visits: [u64; 4],
}

/// Machine-readable result of a solver or learning run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WorldSummary {
    pub title: String,
    pub width: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweeps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<usize>,
    pub cells: Vec<CellSummary>,
}

impl WorldSummary {
    pub fn new(world: &GridWorld, policy: &dyn Policy) -> Self {
        let cells = world
            .all_fields()
            .map(|c| {
                let position = Position::new(c.x(), c.y());
                CellSummary {
                    position,
                    kind: c.kind(),
                    reward: c.reward(),
                    value: c.value(),
                    policy: policy.policy(position),
                    action_values: *c.action_values(),
                    action_visits: *c.action_visits(),
                }
            })
            .collect();

        Self {
            title: world.title().to_string(),
            width: world.width(),
            height: world.height(),
            sweeps: None,
            converged: None,
            episodes: None,
            cells,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algos::model_based::vi::ValueIteration;
    use crate::envs::board::{BoardBuilder, CellOverride};

    fn default_world() -> GridWorld {
        let cells = BoardBuilder::new(4, 3, -0.04)
            .with_override(CellOverride::new("S", 0, 0, None))
            .with_override(CellOverride::new("T", 3, 2, Some(1.)))
            .with_override(CellOverride::new("T", 3, 1, Some(-1.)))
            .with_override(CellOverride::new("F", 1, 1, None))
            .build()
            .unwrap();
        GridWorld::new("default", cells, 1., 0.2, [0.8, 0.1, 0.1, 0.]).unwrap()
    }

    #[test]
    fn str_value_is_fixed_width() {
        let mut cell = Cell::new(CellKind::Normal, 0, 1, Some(1.));
        assert_eq!(str_value(&cell), "xxxxxxx");

        cell.push_value(1.2345678);
        assert_eq!(str_value(&cell), "1.23456");

        cell.push_value(1.2345699);
        assert_eq!(str_value(&cell), "1.23456");

        cell.push_value(-0.70532);
        assert_eq!(str_value(&cell), "-0.7053");

        cell.push_value(0.5);
        assert_eq!(str_value(&cell), "    0.5");

        cell.push_value(1.);
        assert_eq!(str_value(&cell), "    1.0");
    }

    #[test]
    fn str_policy_marks_missing_action() {
        assert_eq!(str_policy(Some(Action::Up)), '^');
        assert_eq!(str_policy(Some(Action::Down)), 'v');
        assert_eq!(str_policy(None), 'x');
    }

    #[test]
    fn history_after_one_sweep() {
        let mut world = default_world();
        ValueIteration::new(&mut world).sweep();

        let mut buf = Vec::new();
        write_value_history(&world, &mut buf).unwrap();
        insta::assert_snapshot!(String::from_utf8(buf).unwrap(), @r###"
        iteration (1,1) (2,1) (3,1) (4,1) (1,2) (3,2) (4,2) (1,3) (2,3) (3,3) (4,3)
        0 0 0 0 0 0 0 -1 0 0 0 1
        1 -0.04 -0.04 -0.04 -0.04 -0.04 -0.04 -1 -0.04 -0.04 0.76 1
        "###);
    }

    #[test]
    fn history_of_unsolved_board_is_header_only() {
        let world = default_world();
        let mut buf = Vec::new();
        write_value_history(&world, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("iteration (1,1) (2,1)"));
    }

    #[test]
    fn policy_rendering_marks_terminal_and_forbidden() {
        let world = default_world();
        insta::assert_snapshot!(render_policy(&world, &world), @r###"
        x x x x
        x x x x
        x x x x
        "###);
    }

    #[test]
    fn values_rendering() {
        let mut world = default_world();
        ValueIteration::new(&mut world).sweep();
        insta::assert_snapshot!(render_values(&world), @r###"
        ---------------------------------
        |  -0.04|  -0.04|   0.76|    1.0|
        ---------------------------------
        |  -0.04|xxxxxxx|  -0.04|   -1.0|
        ---------------------------------
        |  -0.04|  -0.04|  -0.04|  -0.04|
        ---------------------------------
        "###);
    }

    #[test]
    fn summary_serializes_cells() {
        let world = default_world();
        let summary = WorldSummary::new(&world, &world);
        assert_eq!(summary.cells.len(), 12);

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["title"], "default");
        assert_eq!(json["cells"][5]["kind"], "Forbidden");
        assert_eq!(json["cells"][5]["reward"], serde_json::Value::Null);
        assert!(json.get("sweeps").is_none());
    }
}
