//! Fact types shared by network tests.

use std::rc::Rc;

/// A shift, optionally assigned to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shift {
    pub id: usize,
    pub employee: Option<usize>,
    pub start: i64,
    pub end: i64,
}

impl Shift {
    pub fn new(id: usize, employee: Option<usize>, start: i64, end: i64) -> Self {
        Self {
            id,
            employee,
            start,
            end,
        }
    }

    /// Same shift, assigned to another employee.
    pub fn assigned(&self, employee: Option<usize>) -> Self {
        Self {
            employee,
            ..self.clone()
        }
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Shift) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Employee {
    pub id: usize,
    pub name: String,
}

impl Employee {
    pub fn new(id: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Shared employees with ids `0..n`, named `"Employee {id}"`.
pub fn employees(n: usize) -> Vec<Rc<Employee>> {
    (0..n)
        .map(|id| Rc::new(Employee::new(id, format!("Employee {id}"))))
        .collect()
}
