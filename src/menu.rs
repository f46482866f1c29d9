//! Interactive five-option menu loop.
//!
//! The loop owns all operator interaction: option dispatch, entity and row
//! selection, and value prompting. Operation errors are printed and the
//! loop continues; only the explicit exit choice or end of input leaves it.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::backend::FieldInput;
use crate::catalog::LogicalEntity;
use crate::client::StoreClient;
use crate::display::render_listing;
use crate::error::StoreError;
use crate::routing::InsertRouter;
use crate::row::Row;

pub struct Menu<'a> {
    editor: DefaultEditor,
    client: &'a StoreClient,
    router: &'a InsertRouter,
}

impl<'a> Menu<'a> {
    pub fn new(client: &'a StoreClient, router: &'a InsertRouter) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            client,
            router,
        })
    }

    /// Run the menu until the operator exits.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            println!("\nDatabase Client");
            println!("1. View data from table");
            println!("2. Insert data into table");
            println!("3. Update data in table");
            println!("4. Delete data from table");
            println!("5. Exit");

            let line = match self.editor.readline("\nSelect option: ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let outcome = match line.trim() {
                "1" => self.view_flow().await,
                "2" => self.insert_flow().await,
                "3" => self.update_flow().await,
                "4" => self.delete_flow().await,
                "5" => {
                    println!("Exiting...");
                    break;
                }
                _ => {
                    println!("Invalid option. Please try again.");
                    continue;
                }
            };

            if let Err(e) = outcome {
                eprintln!("Error: {e}");
            }
        }
        Ok(())
    }

    async fn view_flow(&mut self) -> Result<()> {
        let Some(entity) = self.select_entity().await? else {
            return Ok(());
        };
        self.list_rows(&entity).await?;
        Ok(())
    }

    async fn insert_flow(&mut self) -> Result<()> {
        let Some(entity) = self.select_entity().await? else {
            return Ok(());
        };

        // The routing cursor moves here, before any prompting, so an
        // abandoned attempt still advances it.
        let target = self.router.choose_backend(&entity)?;

        let executor = self.client.executor();
        let columns = executor.insert_fields(&entity).await;

        println!("\nInserting into {}:", entity.name);
        let mut fields = Vec::new();
        for column in &columns {
            let Some(line) = self.read_line(&format!("{column}: "))? else {
                return Ok(());
            };
            let value = line.trim();
            if !value.is_empty() {
                fields.push(FieldInput::new(column, Some(value.to_string())));
            }
        }

        if fields.is_empty() {
            println!("No data provided. Insert cancelled.");
            return Ok(());
        }

        executor.insert(&entity, target, &fields).await?;
        println!("\nData inserted successfully");
        Ok(())
    }

    async fn update_flow(&mut self) -> Result<()> {
        let Some(entity) = self.select_entity().await? else {
            return Ok(());
        };
        let Some(row) = self.select_row(&entity, "\nSelect row to update: ").await? else {
            return Ok(());
        };

        let executor = self.client.executor();
        let columns = executor.update_fields(&entity, &row).await;

        let mut fields = Vec::new();
        for column in &columns {
            let Some(line) = self.read_line(&format!("New value for {column}: "))? else {
                return Ok(());
            };
            let value = line.trim();
            if !value.is_empty() {
                fields.push(FieldInput::new(column, Some(value.to_string())));
            }
        }

        if fields.is_empty() {
            println!("No changes supplied. Update cancelled.");
            return Ok(());
        }

        let affected = executor.update(&entity, &row, &fields).await?;
        if affected > 0 {
            println!("Row updated successfully.");
        } else {
            println!("No matching row found.");
        }
        Ok(())
    }

    async fn delete_flow(&mut self) -> Result<()> {
        let Some(entity) = self.select_entity().await? else {
            return Ok(());
        };
        let Some(row) = self.select_row(&entity, "\nSelect row to delete: ").await? else {
            return Ok(());
        };

        let executor = self.client.executor();
        let deleted = executor.delete(&entity, &row).await?;
        if deleted > 0 {
            println!("Row deleted successfully.");
        } else {
            println!("No matching row found.");
        }
        Ok(())
    }

    /// List the catalog and let the operator pick one entity.
    async fn select_entity(&mut self) -> Result<Option<LogicalEntity>> {
        let catalog = self.client.catalog().await;
        if catalog.is_empty() {
            println!("No tables found in either database.");
            return Ok(None);
        }

        println!("\nAvailable tables:");
        for (i, entity) in catalog.iter().enumerate() {
            println!("{}. {}", i + 1, entity.name);
        }

        let Some(line) = self.read_line("\nSelect a table: ")? else {
            return Ok(None);
        };
        let index = parse_selection(&line, catalog.len())?;
        Ok(Some(catalog[index].clone()))
    }

    /// List the entity's rows and let the operator pick one.
    async fn select_row(&mut self, entity: &LogicalEntity, prompt: &str) -> Result<Option<Row>> {
        let mut rows = self.list_rows(entity).await?;

        let Some(line) = self.read_line(prompt)? else {
            return Ok(None);
        };
        let index = parse_selection(&line, rows.len())?;
        Ok(Some(rows.remove(index)))
    }

    /// Fetch, print, and return every row of the entity.
    async fn list_rows(&mut self, entity: &LogicalEntity) -> Result<Vec<Row>> {
        let executor = self.client.executor();
        let rows = executor.read_all(entity).await?;

        println!("\nData from {} ({} rows):", entity.name, rows.len());
        for line in render_listing(&rows, entity.primary_key.as_deref()) {
            println!("{line}");
        }
        Ok(rows)
    }

    /// One line of operator input; `None` means the flow was cancelled.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse a 1-indexed selection against `count` listed choices.
fn parse_selection(input: &str, count: usize) -> crate::error::Result<usize> {
    let trimmed = input.trim();
    let choice: usize = trimmed
        .parse()
        .map_err(|_| StoreError::invalid_selection(trimmed))?;
    if choice == 0 || choice > count {
        return Err(StoreError::invalid_selection(trimmed));
    }
    Ok(choice - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_accepts_range() {
        assert_eq!(parse_selection("1", 3).unwrap(), 0);
        assert_eq!(parse_selection("3", 3).unwrap(), 2);
        assert_eq!(parse_selection("  2  ", 3).unwrap(), 1);
    }

    #[test]
    fn test_parse_selection_rejects_out_of_range() {
        assert!(matches!(
            parse_selection("0", 3),
            Err(StoreError::InvalidSelection { .. })
        ));
        assert!(matches!(
            parse_selection("4", 3),
            Err(StoreError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_parse_selection_rejects_non_numeric() {
        let err = parse_selection("abc", 3).unwrap_err();
        assert!(matches!(err, StoreError::InvalidSelection { .. }));
        assert_eq!(err.to_string(), "invalid selection: abc");
    }

    #[test]
    fn test_parse_selection_rejects_anything_when_empty() {
        assert!(parse_selection("1", 0).is_err());
    }
}
