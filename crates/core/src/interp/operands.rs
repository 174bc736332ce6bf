//! Pending operator arguments.
//!
//! Accessors index from the end: index 0 is the operand written just before
//! the operator. Missing or mistyped operands read as 0 or the empty string.

use std::collections::VecDeque;

use crate::model::objects::PDFObject;
use crate::parser::lexer::Number;
use crate::utils::{Matrix, Point};

/// Operands kept before the oldest is dropped.
pub const MAX_OPERANDS: usize = 16;

/// One operand as read from the content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(Number),
    Name(String),
    Object(PDFObject),
}

#[derive(Debug, Default)]
pub struct OperandBuffer {
    items: VecDeque<Operand>,
}

impl OperandBuffer {
    pub fn new() -> Self {
        Self {
            items: VecDeque::with_capacity(MAX_OPERANDS),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append an operand, dropping the oldest when full.
    pub fn push(&mut self, operand: Operand) {
        if self.items.len() == MAX_OPERANDS {
            self.items.pop_front();
        }
        self.items.push_back(operand);
    }

    fn get(&self, index: usize) -> Option<&Operand> {
        let pos = self.items.len().checked_sub(index + 1)?;
        self.items.get(pos)
    }

    pub fn number(&self, index: usize) -> f64 {
        match self.get(index) {
            Some(Operand::Number(n)) => n.value,
            Some(Operand::Object(obj)) => obj.number(),
            _ => 0.0,
        }
    }

    pub fn integer(&self, index: usize) -> i64 {
        match self.get(index) {
            Some(Operand::Number(n)) => n.value as i64,
            Some(Operand::Object(obj)) => obj.as_int().unwrap_or(0),
            _ => 0,
        }
    }

    /// Name text, or the bytes of a string operand.
    pub fn string(&self, index: usize) -> String {
        match self.get(index) {
            Some(Operand::Name(name)) => name.clone(),
            Some(Operand::Object(obj)) => obj.string_value(),
            _ => String::new(),
        }
    }

    /// Raw bytes of a string operand (names give their text).
    pub fn bytes(&self, index: usize) -> Vec<u8> {
        match self.get(index) {
            Some(Operand::Name(name)) => name.as_bytes().to_vec(),
            Some(Operand::Object(PDFObject::String(bytes))) => bytes.clone(),
            Some(Operand::Object(PDFObject::Name(name))) => name.as_bytes().to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn is_name(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Operand::Name(_)))
    }

    /// Operand as an object; numbers and names are converted.
    pub fn object(&self, index: usize) -> Option<PDFObject> {
        Some(match self.get(index)? {
            Operand::Number(n) => n.as_object(),
            Operand::Name(name) => PDFObject::Name(name.clone()),
            Operand::Object(obj) => obj.clone(),
        })
    }

    /// The last `count` operands as numbers, in stream order.
    pub fn numbers(&self, count: usize) -> Vec<f64> {
        (0..count).rev().map(|i| self.number(i)).collect()
    }

    /// Every operand as a number, in stream order.
    pub fn all_numbers(&self) -> Vec<f64> {
        self.numbers(self.len())
    }

    /// The pair `(number(index + 1), number(index))`.
    pub fn point(&self, index: usize) -> Point {
        (self.number(index + 1), self.number(index))
    }

    /// The last six operands as a matrix.
    pub fn matrix(&self) -> Matrix {
        (
            self.number(5),
            self.number(4),
            self.number(3),
            self.number(2),
            self.number(1),
            self.number(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: i64) -> Operand {
        Operand::Number(Number::int(v))
    }

    #[test]
    fn indexes_from_the_end() {
        let mut ops = OperandBuffer::new();
        ops.push(num(1));
        ops.push(Operand::Name("F1".into()));
        ops.push(num(12));
        assert_eq!(ops.number(0), 12.0);
        assert_eq!(ops.string(1), "F1");
        assert_eq!(ops.number(1), 0.0);
        assert_eq!(ops.number(7), 0.0);
        assert_eq!(ops.numbers(3), vec![1.0, 0.0, 12.0]);
    }

    #[test]
    fn oldest_operand_is_dropped() {
        let mut ops = OperandBuffer::new();
        for i in 0..20 {
            ops.push(num(i));
        }
        assert_eq!(ops.len(), MAX_OPERANDS);
        assert_eq!(ops.number(MAX_OPERANDS - 1), 4.0);
        assert_eq!(ops.number(0), 19.0);
    }

    #[test]
    fn matrix_reads_last_six() {
        let mut ops = OperandBuffer::new();
        for i in 1..=7 {
            ops.push(num(i));
        }
        assert_eq!(ops.matrix(), (2.0, 3.0, 4.0, 5.0, 6.0, 7.0));
        assert_eq!(ops.point(0), (6.0, 7.0));
    }
}
