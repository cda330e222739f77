//! Output buffers and the stack of emission targets.
//!
//! Lines always go to the target on top of the stack. A `Suppressed` entry
//! anywhere in the stack drops every line, which is how dry runs stay silent
//! even when they compile nested definitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Main,
    Hoisted,
    Suppressed,
    /// Private buffer, index into the capture stack.
    Capture(usize),
}

#[derive(Debug)]
pub struct Emitter {
    main: Vec<String>,
    hoisted: Vec<String>,
    captures: Vec<Vec<String>>,
    targets: Vec<Target>,
    suppressed: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Emitter::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            main: vec![],
            hoisted: vec![],
            captures: vec![],
            targets: vec![Target::Main],
            suppressed: 0,
        }
    }

    pub fn current(&self) -> Target {
        *self.targets.last().unwrap_or(&Target::Main)
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed > 0
    }

    pub fn push(&mut self, target: Target) {
        if target == Target::Suppressed {
            self.suppressed += 1;
        }
        self.targets.push(target);
    }

    /// Pops the top target. The bottom `Main` entry is never removed.
    pub fn pop(&mut self) -> Target {
        if self.targets.len() == 1 {
            return Target::Main;
        }
        let target = self.targets.pop().unwrap_or(Target::Main);
        if target == Target::Suppressed {
            self.suppressed -= 1;
        }
        target
    }

    /// Target for a function or class definition: leaves the main flow for
    /// the hoisted buffer, otherwise keeps writing where it already is.
    pub fn push_definition(&mut self) {
        match self.current() {
            Target::Main => self.push(Target::Hoisted),
            other => self.push(other),
        }
    }

    pub fn begin_capture(&mut self) {
        self.captures.push(vec![]);
        let index = self.captures.len() - 1;
        self.push(Target::Capture(index));
    }

    /// Pops targets down to the innermost capture and returns what it collected.
    pub fn end_capture(&mut self) -> Vec<String> {
        while let Some(target) = self.targets.last().copied() {
            if self.targets.len() == 1 {
                break;
            }
            self.pop();
            if let Target::Capture(_) = target {
                break;
            }
        }
        self.captures.pop().unwrap_or_default()
    }

    pub fn emit(&mut self, line: impl Into<String>) {
        if self.is_suppressed() {
            return;
        }
        let line = line.into();
        match self.current() {
            Target::Main => self.main.push(line),
            Target::Hoisted => self.hoisted.push(line),
            Target::Capture(index) => {
                if let Some(capture) = self.captures.get_mut(index) {
                    capture.push(line);
                }
            }
            Target::Suppressed => {}
        }
    }

    /// Appends a finished unit's buffers, e.g. from an imported module.
    pub fn merge(&mut self, hoisted: Vec<String>, main: Vec<String>) {
        if self.is_suppressed() {
            return;
        }
        self.hoisted.extend(hoisted);
        self.main.extend(main);
    }

    pub fn main(&self) -> &[String] {
        &self.main
    }

    pub fn hoisted(&self) -> &[String] {
        &self.hoisted
    }

    pub fn into_buffers(self) -> (Vec<String>, Vec<String>) {
        (self.hoisted, self.main)
    }
}
