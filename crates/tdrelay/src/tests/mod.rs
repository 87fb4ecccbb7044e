//! Engine and authorization tests driven through the scripted transport.

mod behaviour;
mod support;
