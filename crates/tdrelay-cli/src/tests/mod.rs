//! Login command tests driven through the scripted transport.

mod support;
mod unit;
