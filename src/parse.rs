//! Parsers for the `.block` / `.net` input pair.
//!
//! Both formats are whitespace-token based with a handful of header lines;
//! blank lines are ignored everywhere. All failures are fatal and carry
//! the 1-based line number where something went wrong.

use std::{collections::HashMap, fs, path::Path, str::FromStr};

use thiserror::Error;

use crate::{
    block::{Block, Terminal},
    dimensions::Dimensions,
    floorplan::Floorplan,
    net::{Net, PinRef},
};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("line {line}: expected an integer, got `{token}`")]
    BadInteger { line: usize, token: String },
    #[error("line {line}: malformed line `{text}`")]
    Malformed { line: usize, text: String },
    #[error("block count mismatch: header says {expected}, file declares {found}")]
    BlockCount { expected: usize, found: usize },
    #[error("terminal count mismatch: header says {expected}, file declares {found}")]
    TerminalCount { expected: usize, found: usize },
    #[error("net count mismatch: header says {expected}, file declares {found}")]
    NetCount { expected: usize, found: usize },
    #[error("line {line}: net pin `{name}` is not a declared block or terminal")]
    UnknownPin { line: usize, name: String },
    #[error("line {line}: net of degree {degree} runs past the end of the file")]
    TruncatedNet { line: usize, degree: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads and parses both input files into a ready-to-run floorplan.
pub fn parse_floorplan(
    alpha: f64,
    block_path: &Path,
    net_path: &Path,
) -> Result<Floorplan, ParseError> {
    let block_text = fs::read_to_string(block_path)?;
    let (outline, blocks, terminals) = parse_block_text(&block_text)?;
    let net_text = fs::read_to_string(net_path)?;
    let nets = parse_net_text(&net_text, &blocks, &terminals)?;
    Ok(Floorplan::new(alpha, outline, blocks, terminals, nets))
}

/// Parses the block file: outline, macros and fixed terminals.
pub fn parse_block_text(
    text: &str,
) -> Result<(Dimensions, Vec<Block>, Vec<Terminal>), ParseError> {
    let mut lines = non_blank_lines(text);

    let (line, rest) = header_line(&mut lines, "Outline:")?;
    let [w, h] = rest[..] else {
        return Err(ParseError::Malformed { line, text: rest.join(" ") });
    };
    let outline = Dimensions::new(parse_int(line, w)?, parse_int(line, h)?);

    let n_blocks = count_header(&mut lines, "NumBlocks:")?;
    let n_terminals = count_header(&mut lines, "NumTerminals:")?;

    let mut blocks = Vec::with_capacity(n_blocks);
    let mut terminals = Vec::with_capacity(n_terminals);
    for (line, text) in lines {
        let tokens: Vec<_> = text.split_whitespace().collect();
        match tokens[..] {
            [name, "terminal", x, y] => {
                terminals.push(Terminal::new(name, parse_int(line, x)?, parse_int(line, y)?));
            }
            [name, w, h] => {
                blocks.push(Block::new(name, parse_int(line, w)?, parse_int(line, h)?));
            }
            _ => return Err(ParseError::Malformed { line, text: text.to_owned() }),
        }
    }

    if blocks.len() != n_blocks {
        return Err(ParseError::BlockCount { expected: n_blocks, found: blocks.len() });
    }
    if terminals.len() != n_terminals {
        return Err(ParseError::TerminalCount { expected: n_terminals, found: terminals.len() });
    }

    Ok((outline, blocks, terminals))
}

/// Parses the net file against the already-declared blocks and terminals.
pub fn parse_net_text(
    text: &str,
    blocks: &[Block],
    terminals: &[Terminal],
) -> Result<Vec<Net>, ParseError> {
    let by_name: HashMap<&str, PinRef> = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name(), PinRef::Block(i)))
        .chain(terminals.iter().enumerate().map(|(i, t)| (t.name(), PinRef::Terminal(i))))
        .collect();

    let mut lines = non_blank_lines(text);
    let n_nets = count_header(&mut lines, "NumNets:")?;

    let mut nets = Vec::with_capacity(n_nets);
    while let Some((line, text)) = lines.next() {
        let tokens: Vec<_> = text.split_whitespace().collect();
        let ["NetDegree:", k] = tokens[..] else {
            return Err(ParseError::Malformed { line, text: text.to_owned() });
        };
        let degree: usize = parse_int(line, k)?;

        let mut pins = Vec::with_capacity(degree);
        for _ in 0..degree {
            let (pin_line, pin_text) =
                lines.next().ok_or(ParseError::TruncatedNet { line, degree })?;
            let name = pin_text.trim();
            let pin = by_name
                .get(name)
                .copied()
                .ok_or_else(|| ParseError::UnknownPin { line: pin_line, name: name.to_owned() })?;
            pins.push(pin);
        }
        nets.push(Net::new(pins));
    }

    if nets.len() != n_nets {
        return Err(ParseError::NetCount { expected: n_nets, found: nets.len() });
    }
    Ok(nets)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().map(|(i, l)| (i + 1, l)).filter(|(_, l)| !l.trim().is_empty())
}

fn parse_int<T: FromStr>(line: usize, token: &str) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::BadInteger { line, token: token.to_owned() })
}

fn header_line<'a, I>(
    lines: &mut I,
    header: &'static str,
) -> Result<(usize, Vec<&'a str>), ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (line, text) = lines.next().ok_or(ParseError::MissingHeader(header))?;
    let mut tokens = text.split_whitespace();
    if tokens.next() != Some(header) {
        return Err(ParseError::MissingHeader(header));
    }
    Ok((line, tokens.collect()))
}

fn count_header<'a, I>(lines: &mut I, header: &'static str) -> Result<usize, ParseError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (line, rest) = header_line(lines, header)?;
    let [token] = rest[..] else {
        return Err(ParseError::Malformed { line, text: rest.join(" ") });
    };
    parse_int(line, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &str = "\
Outline: 600 600
NumBlocks: 3
NumTerminals: 2

bk1 200 200
bk2 300 100
bk3 100 300
VSS terminal 0 0
VDD terminal 600 600
";

    #[test]
    fn block_file_round_trip() {
        let (outline, blocks, terminals) = parse_block_text(BLOCKS).unwrap();
        assert_eq!(outline, Dimensions::new(600, 600));
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].name(), "bk2");
        assert_eq!(blocks[1].dims(), Dimensions::new(300, 100));
        assert_eq!(terminals.len(), 2);
        assert_eq!(terminals[1].point().x, 600);
    }

    #[test]
    fn net_file_resolves_pins() {
        let (_, blocks, terminals) = parse_block_text(BLOCKS).unwrap();
        let nets = parse_net_text(
            "NumNets: 2\nNetDegree: 2\nbk1\nVSS\nNetDegree: 3\nbk1\nbk2\nbk3\n",
            &blocks,
            &terminals,
        )
        .unwrap();
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].pins(), &[PinRef::Block(0), PinRef::Terminal(0)]);
        assert_eq!(nets[1].pins().len(), 3);
    }

    #[test]
    fn missing_outline_header() {
        let err = parse_block_text("NumBlocks: 0\nNumTerminals: 0\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader("Outline:")));
    }

    #[test]
    fn non_integer_dimension() {
        let err =
            parse_block_text("Outline: 10 ten\nNumBlocks: 0\nNumTerminals: 0\n").unwrap_err();
        assert!(matches!(err, ParseError::BadInteger { line: 1, .. }));
    }

    #[test]
    fn block_count_mismatch_is_fatal() {
        let err = parse_block_text("Outline: 10 10\nNumBlocks: 2\nNumTerminals: 0\nbk1 5 5\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::BlockCount { expected: 2, found: 1 }));
    }

    #[test]
    fn unknown_pin_is_fatal() {
        let (_, blocks, terminals) = parse_block_text(BLOCKS).unwrap();
        let err = parse_net_text("NumNets: 1\nNetDegree: 2\nbk1\nghost\n", &blocks, &terminals)
            .unwrap_err();
        assert!(matches!(err, ParseError::UnknownPin { name, .. } if name == "ghost"));
    }

    #[test]
    fn truncated_net_is_fatal() {
        let (_, blocks, terminals) = parse_block_text(BLOCKS).unwrap();
        let err =
            parse_net_text("NumNets: 1\nNetDegree: 3\nbk1\nbk2\n", &blocks, &terminals).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedNet { degree: 3, .. }));
    }

    #[test]
    fn net_count_mismatch_is_fatal() {
        let (_, blocks, terminals) = parse_block_text(BLOCKS).unwrap();
        let err = parse_net_text("NumNets: 2\nNetDegree: 2\nbk1\nbk2\n", &blocks, &terminals)
            .unwrap_err();
        assert!(matches!(err, ParseError::NetCount { expected: 2, found: 1 }));
    }
}
