// Edge-hit cue: played whenever the obstacle leaves the view and respawns.

use std::io::Write;

pub trait EdgeCue {
    fn edge_hit(&mut self);
}

/// Rings the terminal bell.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl EdgeCue for TerminalBell {
    fn edge_hit(&mut self) {
        let mut out = std::io::stdout();
        // A missing/closed terminal just means no sound.
        let _ = out.write_all(b"\x07").and_then(|_| out.flush());
    }
}

/// Silent; counts how often it was triggered.
#[derive(Debug, Default)]
pub struct CountingCue {
    pub hits: u32,
}

impl EdgeCue for CountingCue {
    fn edge_hit(&mut self) {
        self.hits += 1;
    }
}
