//! Word churn - rotate words from a word list through a RehashTrie.
//!
//! Keeps a ring of the most recent `--in-flight` words in the map: before a
//! new word is set, the word it displaces from the ring is cleared. At the end
//! the structure is optionally dumped and its statistics printed.
//!
//! Default word list: /usr/share/dict/words (one word per line).

use clap::Parser;
use rehash_trie::RehashTrie;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "word_churn")]
#[command(about = "Churn a word list through a RehashTrie and report its shape")]
struct Args {
    /// Path to the word list (one word per line)
    #[arg(short, long, default_value = "/usr/share/dict/words")]
    path: String,

    /// Number of words kept in the map at once (0 keeps every word)
    #[arg(short, long, default_value_t = 100)]
    in_flight: usize,

    /// Print the full bucket structure before the statistics
    #[arg(long, default_value_t = false)]
    dump: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let data = fs::read_to_string(&args.path)?;

    let mut trie: RehashTrie<usize> = RehashTrie::new();
    let mut ring: VecDeque<&str> = VecDeque::with_capacity(args.in_flight);
    let mut words = 0usize;

    let start = Instant::now();
    for (line_no, word) in data.lines().map(str::trim).enumerate() {
        if word.is_empty() {
            continue;
        }
        if args.in_flight > 0 && ring.len() == args.in_flight {
            if let Some(oldest) = ring.pop_front() {
                trie.clear(oldest.as_bytes());
            }
        }
        if let Err(err) = trie.set(word.as_bytes(), line_no) {
            eprintln!("set {word:?} failed: {err}");
            continue;
        }
        ring.push_back(word);
        words += 1;
    }
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.dump {
        trie.dump(&mut out)?;
    }

    let stats = trie.stats();
    writeln!(out, "words\t\t: {words} in {:.3}s", elapsed.as_secs_f64())?;
    writeln!(out, "live keys\t: {}", trie.len())?;
    writeln!(out, "depth\t\t: {}", trie.depth())?;
    writeln!(out, "tables\t\t: {}", stats.tables)?;
    writeln!(out, "entries\t\t: {}", stats.entries)?;
    writeln!(out, "nulls\t\t: {}", stats.nulls)?;
    writeln!(out, "sparseness\t: {:.6}", trie.sparseness())?;
    writeln!(out, "largest alloc\t: {} bytes", stats.largest_allocation)?;
    Ok(())
}
