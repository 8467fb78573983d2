//! Iterator sources.
//!
//! `next` returns [`Value::IteratorEnd`] once exhausted. Sources are driven
//! through a shared reference so an iterator value can be cloned and
//! consumed from several places, as the language allows.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::call::CallContext;
use crate::errors::{integer_overflow, EvalResult};
use crate::value::{ArrayRef, IntegerValue, RangeValue, Value};

/// A lazily produced sequence of values.
pub trait IteratorSource: Send + Sync {
    /// The next element, or `Value::IteratorEnd`.
    fn next(&self, ctx: &mut dyn CallContext) -> EvalResult;

    /// Stop early; later `next` calls report the end.
    fn close(&self);
}

pub type IteratorRef = Arc<dyn IteratorSource>;

/// Walks an array by index, observing pushes made during iteration.
pub struct ArrayIterator {
    array: ArrayRef,
    index: AtomicUsize,
    closed: AtomicBool,
}

impl ArrayIterator {
    pub fn new(array: ArrayRef) -> Self {
        ArrayIterator {
            array,
            index: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

impl IteratorSource for ArrayIterator {
    fn next(&self, _ctx: &mut dyn CallContext) -> EvalResult {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(Value::IteratorEnd);
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        Ok(self.array.get(index).unwrap_or(Value::IteratorEnd))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Counts from start to end, downward when `end < start`.
///
/// Elements keep the start's kind; walking past that kind's range while
/// still inside the bounds raises `integer overflow`.
pub struct RangeIterator {
    range: RangeValue,
    cursor: Mutex<Cursor>,
}

enum Cursor {
    At(IntegerValue),
    Overflowed,
    Done,
}

impl RangeIterator {
    pub fn new(range: RangeValue) -> Self {
        RangeIterator {
            cursor: Mutex::new(Cursor::At(range.start)),
            range,
        }
    }
}

impl IteratorSource for RangeIterator {
    fn next(&self, _ctx: &mut dyn CallContext) -> EvalResult {
        let mut cursor = self.cursor.lock();
        let value = match std::mem::replace(&mut *cursor, Cursor::Done) {
            Cursor::At(value) if self.range.contains_step(value) => value,
            Cursor::At(_) | Cursor::Done => return Ok(Value::IteratorEnd),
            Cursor::Overflowed => return Err(integer_overflow()),
        };
        *cursor = match value.step(self.range.descending()) {
            Ok(next) => Cursor::At(next),
            Err(_) if value.cmp_value(self.range.end) == std::cmp::Ordering::Equal => Cursor::Done,
            Err(_) => Cursor::Overflowed,
        };
        Ok(Value::Integer(value))
    }

    fn close(&self) {
        *self.cursor.lock() = Cursor::Done;
    }
}

/// Yields the characters of a string.
pub struct StringIterator {
    chars: Vec<char>,
    index: AtomicUsize,
    closed: AtomicBool,
}

impl StringIterator {
    pub fn new(text: &str) -> Self {
        StringIterator {
            chars: text.chars().collect(),
            index: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

impl IteratorSource for StringIterator {
    fn next(&self, _ctx: &mut dyn CallContext) -> EvalResult {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(Value::IteratorEnd);
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .chars
            .get(index)
            .map_or(Value::IteratorEnd, |c| Value::Char(*c)))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
