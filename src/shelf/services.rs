//! Every resource store, opened once from configuration.

use crate::config::{Module, ShelfConfig};
use crate::factory::{open_document_db, open_repository};
use crate::logging::Logger;
use crate::model::{BlogPost, Deposit, FileDetails, Note, Purchase, ViceBankUser};
use crate::schedule::BackupJob;
use crate::store::repository::SharedStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub notes: SharedStore<Note>,
    pub blog: SharedStore<BlogPost>,
    pub files: SharedStore<FileDetails>,
    pub vice_bank_users: SharedStore<ViceBankUser>,
    pub deposits: SharedStore<Deposit>,
    pub purchases: SharedStore<Purchase>,
}

impl Services {
    /// Never fails; see [`crate::factory`] for the fallback rules.
    pub fn open(config: &ShelfConfig, logger: &dyn Logger) -> Self {
        let document = open_document_db(config, logger);
        let document = document.as_ref();
        let vice_bank = config.module(Module::ViceBank);

        Self {
            notes: SharedStore::new(open_repository(
                Module::Notes,
                &config.notes,
                document,
                logger,
            )),
            blog: SharedStore::new(open_repository(Module::Blog, &config.blog, document, logger)),
            files: SharedStore::new(open_repository(
                Module::Files,
                &config.files,
                document,
                logger,
            )),
            vice_bank_users: SharedStore::new(open_repository(
                Module::ViceBank,
                vice_bank,
                document,
                logger,
            )),
            deposits: SharedStore::new(open_repository(
                Module::ViceBank,
                vice_bank,
                document,
                logger,
            )),
            purchases: SharedStore::new(open_repository(
                Module::ViceBank,
                vice_bank,
                document,
                logger,
            )),
        }
    }

    /// One job per collection, in a fixed order.
    pub fn backup_jobs(&self) -> Vec<Arc<dyn BackupJob>> {
        vec![
            Arc::new(self.notes.clone()),
            Arc::new(self.blog.clone()),
            Arc::new(self.files.clone()),
            Arc::new(self.vice_bank_users.clone()),
            Arc::new(self.deposits.clone()),
            Arc::new(self.purchases.clone()),
        ]
    }
}
