use std::fs::File;
use std::io::{BufRead, Lines};

use tracing::warn;

use crate::error::{Error, Result};
use crate::histogram::{Buckets, Histogram, HistogramStore};

pub fn get_reader(file: File) -> Result<impl BufRead> {
    // Mapping a zero length file fails on some systems, and there's no header to read anyway
    if file.metadata()?.len() == 0 {
        return Err(Error::MissingHeader);
    }
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 16 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, histogram files are read once front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Cursor::new(m))
        }
    }
}

/// Parses the bucket definition line: an identifier column followed by the boundaries
///
/// Loading stops after the first boundary at or beyond `max_reuse_distance`, that boundary is
/// still included
///
/// # Examples
///
/// ```
/// use statlib::io::parse_buckets;
/// assert_eq!(parse_buckets("id,0,1,2,4,8", 4).unwrap(), vec![0, 1, 2, 4]);
/// ```
pub fn parse_buckets(line: &str, max_reuse_distance: u64) -> Result<Vec<u64>> {
    let mut boundaries = Vec::new();
    for (index, token) in line.trim_end().split(',').skip(1).enumerate() {
        let boundary = token
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidBoundary { index, token: token.to_string() })?;
        boundaries.push(boundary);
        if boundary >= max_reuse_distance {
            break;
        }
    }
    Ok(boundaries)
}

/// Parses a histogram line into its identifier and at most `buckets` counts
///
/// Counts stop at the first value which isn't an unsigned integer, leaving a short row
///
/// # Examples
///
/// ```
/// use statlib::io::parse_row;
/// let (id, counts) = parse_row("trace_a,10,5,3,2,99", 4);
/// assert_eq!(id, "trace_a");
/// assert_eq!(counts, vec![10, 5, 3, 2]);
/// ```
pub fn parse_row(line: &str, buckets: usize) -> (String, Vec<u64>) {
    let mut tokens = line.trim_end().split(',');
    let id = tokens.next().unwrap_or_default().to_string();
    let mut counts = Vec::with_capacity(buckets);
    for token in tokens.take(buckets) {
        match token.trim().parse::<u64>() {
            Ok(count) => counts.push(count),
            Err(_) => {
                warn!(row = id.as_str(), token, "couldn't parse histogram count, dropping the rest of the row");
                break;
            }
        }
    }
    (id, counts)
}

/// Streams the histograms of an input, one row at a time
pub struct HistogramReader<R: BufRead> {
    lines: Lines<R>,
    store: HistogramStore,
}

impl<R: BufRead> HistogramReader<R> {
    /// Reads the bucket definition from the first line of the input
    pub fn new(reader: R, max_reuse_distance: u64) -> Result<Self> {
        let mut lines = reader.lines();
        let header = lines.next().ok_or(Error::MissingHeader)??;
        let buckets = Buckets::new(parse_buckets(&header, max_reuse_distance)?)?;
        Ok(Self {
            lines,
            store: HistogramStore::new(buckets),
        })
    }

    pub fn buckets(&self) -> &Buckets {
        self.store.buckets()
    }
}

impl<R: BufRead> Iterator for HistogramReader<R> {
    type Item = Result<(String, Histogram)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.trim().is_empty() {
                continue;
            }
            let (id, counts) = parse_row(&line, self.store.buckets().len());
            let histogram = self.store.load_row(&id, &counts);
            return Some(Ok((id, histogram)));
        }
    }
}
