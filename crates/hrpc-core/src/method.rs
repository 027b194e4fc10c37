//! Procedure descriptors.
//!
//! A `Method<Req, Resp>` fixes, at compile time, which request and response
//! types travel on a given (service, procedure) target. Both the client stub
//! and the server dispatcher are keyed by these descriptors, so decoding into
//! the wrong type cannot happen.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::Message;

/// (service-name, procedure-name) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub service: &'static str,
    pub procedure: &'static str,
}

impl Target {
    /// HTTP path form: `/<service>/<procedure>`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.procedure)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.procedure)
    }
}

pub struct Method<Req, Resp> {
    target: Target,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req: Message, Resp: Message> Method<Req, Resp> {
    pub const fn new(service: &'static str, procedure: &'static str) -> Self {
        Self {
            target: Target { service, procedure },
            _types: PhantomData,
        }
    }
}

impl<Req, Resp> Method<Req, Resp> {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn service(&self) -> &'static str {
        self.target.service
    }

    pub fn procedure(&self) -> &'static str {
        self.target.procedure
    }
}

// Manual impls: derive would demand `Req: Clone` etc.
impl<Req, Resp> Clone for Method<Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for Method<Req, Resp> {}

impl<Req, Resp> fmt::Debug for Method<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("target", &self.target).finish()
    }
}
