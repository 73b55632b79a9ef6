use crate::error::{DcResult, DecipherError};
use crate::permutation::Permutation;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Reads a text file with line breaks folded into single spaces.
pub fn read_text<P: AsRef<Path>>(path: P) -> DcResult<String> {
    let path = path.as_ref();
    let text = read_text_from_reader(File::open(path)?)?;
    debug!("Read {} chars from {}", text.chars().count(), path.display());
    Ok(text)
}

/// Bigrams across line boundaries see a space, exactly as if the text had
/// been written on one line.
pub fn read_text_from_reader<R: Read>(reader: R) -> DcResult<String> {
    let lines = BufReader::new(reader)
        .lines()
        .collect::<Result<Vec<String>, _>>()?;
    Ok(lines.join(" "))
}

/// Writes one `from to` pair per line, sorted by source character.
pub fn save_key<P: AsRef<Path>>(permutation: &Permutation, path: P) -> DcResult<()> {
    let path = path.as_ref();
    write_key(permutation, File::create(path)?)?;
    info!("Saved key ({} entries) to {}", permutation.len(), path.display());
    Ok(())
}

pub fn write_key<W: Write>(permutation: &Permutation, writer: W) -> DcResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(writer);

    for (from, to) in permutation.iter() {
        wtr.write_record([from.to_string(), to.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn load_key<P: AsRef<Path>>(path: P) -> DcResult<Permutation> {
    read_key(File::open(path)?)
}

pub fn read_key<R: Read>(reader: R) -> DcResult<Permutation> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut pairs = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != 2 {
            return Err(DecipherError::Validation(format!(
                "Key line {} has {} fields, expected 2",
                row + 1,
                record.len()
            )));
        }
        pairs.push((single_char(&record[0], row)?, single_char(&record[1], row)?));
    }
    Permutation::from_pairs(pairs)
}

fn single_char(field: &str, row: usize) -> DcResult<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(DecipherError::Validation(format!(
            "Key line {}: '{}' is not a single character",
            row + 1,
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_lines_fold_to_spaces() {
        let text = read_text_from_reader(Cursor::new("first line\nsecond\n")).unwrap();
        assert_eq!(text, "first line second");

        let text = read_text_from_reader(Cursor::new("crlf\r\nline")).unwrap();
        assert_eq!(text, "crlf line");

        let text = read_text_from_reader(Cursor::new("")).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_key_round_trip_in_memory() {
        let p = Permutation::from_pairs([('a', ' '), (' ', '"'), ('"', 'a')]).unwrap();
        let mut buf = Vec::new();
        write_key(&p, &mut buf).unwrap();
        let back = read_key(Cursor::new(buf)).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_key_rejects_bad_lines() {
        assert!(matches!(
            read_key(Cursor::new("a b c\n")),
            Err(DecipherError::Validation(_))
        ));
        assert!(matches!(
            read_key(Cursor::new("ab c\n")),
            Err(DecipherError::Validation(_))
        ));
        assert!(matches!(
            read_key(Cursor::new("a b\nb b\n")),
            Err(DecipherError::Validation(_))
        ));
    }
}
