//! Method identities, inlining chains and inlining decision trees.
//!
//! HotSpot logs identify methods by their holder class (in internal
//! `java/lang/String` form), name and signature. The types here keep the raw
//! fields and render them in the dotted form used by every report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Java method as named in the compilation log.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    /// Holder class in internal form, e.g. `java/lang/String`.
    pub holder: String,
    /// Method name, e.g. `hashCode` or `<init>`.
    pub name: String,
    /// JVM descriptor, e.g. `()I`. Absent in some older logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Bytecode size of the method.
    #[serde(default)]
    pub bytes: u32,
}

impl Method {
    /// Creates a method with no signature.
    pub fn new(
        holder: impl Into<String>,
        name: impl Into<String>,
        bytes: u32,
    ) -> Self {
        Self {
            holder: holder.into(),
            name: name.into(),
            signature: None,
            bytes,
        }
    }

    /// Returns the holder class with `/` separators replaced by `.`.
    pub fn dotted_holder(&self) -> String {
        self.holder.replace('/', ".")
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} ({} bytes)",
            self.dotted_holder(),
            self.name,
            self.bytes
        )
    }
}

/// One frame of an inlining chain at a particular bytecode index.
///
/// `outer` points at the caller frame the method was inlined into; the chain
/// ends at the root method of the compilation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmState {
    pub method: Method,
    pub bci: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer: Option<Box<JvmState>>,
}

impl JvmState {
    /// Iterates the chain from this frame out to the outermost caller.
    pub fn frames(&self) -> impl Iterator<Item = &JvmState> {
        std::iter::successors(Some(self), |jvms| jvms.outer.as_deref())
    }
}

impl fmt::Display for JvmState {
    /// Renders every frame as ` holder.method@bci`, innermost first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames() {
            write!(
                f,
                " {}.{}@{}",
                frame.method.dotted_holder(),
                frame.method.name,
                frame.bci
            )?;
        }
        Ok(())
    }
}

/// An inlining decision made while parsing a compilation.
///
/// The root call sites hang off the compilation; `calls` holds the decisions
/// made inside an inlined callee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub method: Method,
    pub bci: i32,
    #[serde(default)]
    pub inlined: bool,
    /// Reason the inliner gave for its decision, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(holder: &str, name: &str, bci: i32) -> JvmState {
        JvmState {
            method: Method::new(holder, name, 10),
            bci,
            outer: None,
        }
    }

    #[test]
    fn method_display_uses_dotted_holder() {
        let m = Method::new("java/lang/String", "hashCode", 55);
        assert_eq!(m.to_string(), "java.lang.String::hashCode (55 bytes)");
    }

    #[test]
    fn jvms_frames_walk_outward() {
        let mut inner = frame("a/Inner", "lock", 3);
        let mut middle = frame("a/Middle", "call", 12);
        middle.outer = Some(Box::new(frame("a/Outer", "run", 40)));
        inner.outer = Some(Box::new(middle));

        let names: Vec<&str> =
            inner.frames().map(|f| f.method.name.as_str()).collect();
        assert_eq!(names, ["lock", "call", "run"]);
        assert_eq!(
            inner.to_string(),
            " a.Inner.lock@3 a.Middle.call@12 a.Outer.run@40"
        );
    }

    #[test]
    fn single_frame_chain() {
        let only = frame("Foo", "bar", 0);
        assert_eq!(only.frames().count(), 1);
        assert_eq!(only.to_string(), " Foo.bar@0");
    }
}
