//! `std::io::Read` over a single file of a fileset.

use crate::error::Error;
use crate::fileset::Fileset;
use std::io::{self, Read};

/// Reads one file of a [`Fileset`] through the standard `Read` trait.
///
/// End-of-stream maps to `Ok(0)`; every other fileset error is converted
/// into an [`io::Error`]. Wrap it in a [`std::io::BufReader`] for line or
/// record oriented consumption.
#[derive(Debug)]
pub struct SlotReader<'a> {
    fileset: &'a Fileset,
    file: usize,
}

impl<'a> SlotReader<'a> {
    pub(crate) fn new(fileset: &'a Fileset, file: usize) -> Self {
        Self { fileset, file }
    }

    /// Index of the file this reader drains.
    pub fn file(&self) -> usize {
        self.file
    }
}

impl Read for SlotReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.fileset.read(self.file, buf) {
            Ok(n) => Ok(n),
            Err(Error::EndOfStream) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
