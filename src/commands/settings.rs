// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::entities::SettingsBook;
use crate::migrate::MigrationContext;
use crate::store::KvStore;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(store: &KvStore, m: &clap::ArgMatches) -> Result<()> {
    let ctx = MigrationContext::from_store(store);
    let mut book = SettingsBook::load(store, &ctx);
    match m.subcommand() {
        Some(("show", sub)) => {
            let s = book.settings();
            if !maybe_print_json(sub.get_flag("json"), s)? {
                let rows = vec![
                    vec!["theme".to_string(), s.theme.clone()],
                    vec!["currency".to_string(), s.currency.clone()],
                    vec!["privacy mode".to_string(), s.privacy_mode.to_string()],
                    vec!["onboarding complete".to_string(), s.onboarding_complete.to_string()],
                ];
                println!("{}", pretty_table(&["Setting", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            if let Some(theme) = sub.get_one::<String>("theme") {
                book.set_theme(theme).into_result()?;
            }
            if let Some(ccy) = sub.get_one::<String>("currency") {
                book.set_currency(ccy).into_result()?;
            }
            if let Some(on) = sub.get_one::<bool>("privacy") {
                book.set_privacy_mode(*on).into_result()?;
            }
            if let Some(done) = sub.get_one::<bool>("onboarded") {
                book.set_onboarding_complete(*done).into_result()?;
            }
            println!("Settings updated");
        }
        _ => {}
    }
    Ok(())
}
