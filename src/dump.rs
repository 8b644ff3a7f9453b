//! Human-readable dump of the bucket structure.

use std::fmt::Debug;
use std::io::{self, Write};

use crate::table::{Bucket, Table};

const INDENT: usize = 4;

impl<V: Debug> Table<V> {
    /// Write every non-empty bucket, one per line, recursing into nested
    /// tables with one more level of indentation.
    pub(crate) fn dump<W: Write + ?Sized>(&self, out: &mut W, level: usize) -> io::Result<()> {
        let width = INDENT * (level + 1);
        for (i, bucket) in self.buckets().iter().enumerate() {
            match bucket {
                Bucket::Empty => {}
                Bucket::Leaf { key, value } => {
                    writeln!(
                        out,
                        "{i:>width$} {}\t{value:?}",
                        String::from_utf8_lossy(key)
                    )?;
                }
                Bucket::Nested(child) => {
                    writeln!(out, "{i:>width$} table ({} entries)", child.entries())?;
                    child.dump(out, level + 1)?;
                }
            }
        }
        Ok(())
    }
}
