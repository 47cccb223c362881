use tp_core::stmt::{Block, Expr, Stmt};
use tp_core::Result;

enum FrameKind {
    Then { cond: Expr },
    Else { cond: Expr, then: Block },
    Loop { item: String, over: Expr },
}

struct Frame {
    kind: FrameKind,
    body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Closed {
    Branch,
    Loop,
}

/// Blocks opened by guards and loops that later steps still emit into.
/// Closing a frame folds it into a statement of its parent.
#[derive(Default)]
pub(crate) struct Frames {
    root: Block,
    open: Vec<Frame>,
}

impl Frames {
    pub fn push(&mut self, stmt: Stmt) {
        match self.open.last_mut() {
            Some(frame) => frame.body.push(stmt),
            None => self.root.push(stmt),
        }
    }

    pub fn open_then(&mut self, cond: Expr) {
        self.open.push(Frame {
            kind: FrameKind::Then { cond },
            body: Block::new(),
        });
    }

    pub fn open_loop(&mut self, item: String, over: Expr) {
        self.open.push(Frame {
            kind: FrameKind::Loop { item, over },
            body: Block::new(),
        });
    }

    /// Continues in the `else` branch of the innermost `if`.
    pub fn switch_to_else(&mut self) -> Result<()> {
        match self.open.pop() {
            Some(Frame {
                kind: FrameKind::Then { cond },
                body,
            }) => {
                self.open.push(Frame {
                    kind: FrameKind::Else { cond, then: body },
                    body: Block::new(),
                });
                Ok(())
            }
            Some(frame) => {
                self.open.push(frame);
                invariant!("no open `if` to continue in its else branch")
            }
            None => invariant!("no open `if` to continue in its else branch"),
        }
    }

    pub fn close(&mut self) -> Result<Closed> {
        let Some(frame) = self.open.pop() else {
            invariant!("no open block to close");
        };
        let (stmt, closed) = match frame.kind {
            FrameKind::Then { cond } => (Stmt::if_then(cond, frame.body), Closed::Branch),
            FrameKind::Else { cond, then } => (
                Stmt::If {
                    cond,
                    then,
                    otherwise: Some(frame.body),
                },
                Closed::Branch,
            ),
            FrameKind::Loop { item, over } => (
                Stmt::ForEach {
                    item,
                    over,
                    body: frame.body,
                },
                Closed::Loop,
            ),
        };
        self.push(stmt);
        Ok(closed)
    }

    /// Number of frames still open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn into_root(self) -> Result<Block> {
        ensure_invariant!(self.open.is_empty(), "{} blocks left open", self.open.len());
        Ok(self.root)
    }
}
