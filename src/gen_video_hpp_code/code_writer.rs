// SPDX-License-Identifier: Apache-2.0
// Copyright 2023 SUSE LLC
// Author: Nicolai Stange <nstange@suse.de>

use std::io;

const INDENT: &[u8] = b"  ";

pub struct CodeWriter<W: io::Write> {
    out: W,
    at_line_start: bool,
}

impl<W: io::Write> CodeWriter<W> {
    pub fn new(out: W) -> Self {
        CodeWriter {
            out,
            at_line_start: true,
        }
    }

    pub fn make_writer(&mut self) -> IndentedCodeWriter<'_, W> {
        IndentedCodeWriter {
            root: self,
            indentation: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

// Writes through to the root CodeWriter, indenting each non-empty line.
// Preprocessor directives always start at column zero.
pub struct IndentedCodeWriter<'a, W: io::Write> {
    root: &'a mut CodeWriter<W>,
    indentation: u8,
}

impl<'a, W: io::Write> IndentedCodeWriter<'a, W> {
    pub fn make_indent(&mut self) -> IndentedCodeWriter<'_, W> {
        assert!(self.root.at_line_start);
        IndentedCodeWriter {
            root: &mut *self.root,
            indentation: self.indentation + 1,
        }
    }
}

impl<'a, W: io::Write> io::Write for IndentedCodeWriter<'a, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        let mut rest = buf;
        while !rest.is_empty() {
            let line_end = rest
                .iter()
                .position(|c| *c == b'\n')
                .map(|p| p + 1)
                .unwrap_or(rest.len());
            let (chunk, tail) = rest.split_at(line_end);
            if self.root.at_line_start && chunk[0] != b'\n' && chunk[0] != b'#' {
                for _ in 0..self.indentation {
                    self.root.out.write_all(INDENT)?;
                }
            }
            self.root.out.write_all(chunk)?;
            self.root.at_line_start = chunk[chunk.len() - 1] == b'\n';
            rest = tail;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        self.root.out.flush()
    }
}
