// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use tracing::debug;

use crate::{DatabaseService, validate_name};

/// Database picker: the known databases plus a cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseDirectory {
    databases: Vec<String>,
    cursor: usize,
}

impl DatabaseDirectory {
    pub fn load<S: DatabaseService>(service: &S) -> Result<Self> {
        let mut directory = Self::default();
        directory.refresh(service)?;
        Ok(directory)
    }

    pub fn refresh<S: DatabaseService>(&mut self, service: &S) -> Result<()> {
        let databases = service
            .list_databases()
            .context("list databases -- check the server address and retry")?;
        debug!(count = databases.len(), "databases listed");
        self.databases = databases;
        self.cursor = self.cursor.min(self.databases.len().saturating_sub(1));
        Ok(())
    }

    /// Creates a database and moves the cursor onto it.
    pub fn create<S: DatabaseService>(&mut self, service: &S, raw_name: &str) -> Result<String> {
        let name = validate_name("database", raw_name)?;
        service
            .create_database(&name)
            .with_context(|| format!("create database {name:?}"))?;
        self.refresh(service)?;
        if !self.databases.contains(&name) {
            self.databases.push(name.clone());
        }
        self.select(&name);
        Ok(name)
    }

    pub fn databases(&self) -> &[String] {
        &self.databases
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&str> {
        self.databases.get(self.cursor).map(String::as_str)
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.databases.iter().position(|db| db == name) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.databases.is_empty() {
            return;
        }
        let len = self.databases.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len - 1) as usize;
    }
}
