//! Explicit transition grouping.
//!
//! Every public mutating call already runs as its own transition. A [`Recording`] holds a
//! grouping scope open across several calls so they are undone and redone together.

use std::ops::{Deref, DerefMut};

use super::Server;
use crate::Result;

/// RAII guard grouping every change made through it into one transition.
///
/// The transition is finalized and routed when the guard is finished or dropped.
///
/// ```
/// # use objectsync::{AttributeType, BuildContext, ObjectId, ObjectType, Server, Value};
/// # #[derive(Default)]
/// # struct Point;
/// # impl ObjectType for Point {
/// #     fn build(&self, ctx: &mut BuildContext<'_>) -> objectsync::Result<()> {
/// #         ctx.add_attribute("x", AttributeType::Int, None)?;
/// #         ctx.add_attribute("y", AttributeType::Int, None)?;
/// #         Ok(())
/// #     }
/// # }
/// # fn main() -> objectsync::Result<()> {
/// let mut server = Server::new()?;
/// server.register::<Point>()?;
/// let id = server.create_object("Point", &ObjectId::root())?;
/// let x = server.get_attribute(&id, "x")?;
/// let y = server.get_attribute(&id, "y")?;
///
/// let mut recording = server.record();
/// x.set(&mut recording, 1)?;
/// y.set(&mut recording, 2)?;
/// recording.finish()?;
///
/// server.undo(None)?;
/// assert_eq!(x.get(&server)?, &Value::from(0));
/// assert_eq!(y.get(&server)?, &Value::from(0));
/// # Ok(())
/// # }
/// ```
pub struct Recording<'a> {
    server: &'a mut Server,
    finished: bool,
}

impl Recording<'_> {
    /// Close the scope and route the transition, reporting routing errors.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.server.finish_scope()
    }
}

impl Deref for Recording<'_> {
    type Target = Server;

    fn deref(&self) -> &Server {
        self.server
    }
}

impl DerefMut for Recording<'_> {
    fn deref_mut(&mut self) -> &mut Server {
        self.server
    }
}

impl Drop for Recording<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.server.finish_scope() {
            tracing::error!(error = %err, "failed to route recorded transition");
        }
    }
}

impl Server {
    /// Open a grouping scope. See [`Recording`].
    pub fn record(&mut self) -> Recording<'_> {
        self.topics.begin();
        Recording {
            server: self,
            finished: false,
        }
    }

    /// Run `f` as one transition.
    pub fn with_record<T>(&mut self, f: impl FnOnce(&mut Server) -> Result<T>) -> Result<T> {
        self.scoped(f)
    }
}
