// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn id_arg() -> Arg {
    Arg::new("id").required(true)
}

pub fn build_cli() -> Command {
    Command::new("pocketledger")
        .about("Local-first personal finance tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Path to the data file (defaults to the platform data dir)"),
        )
        .subcommand(Command::new("init").about("Create the data file and seed defaults"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name"))
                        .arg(opt("type").default_value("bank"))
                        .arg(opt("currency"))
                        .arg(opt("balance").default_value("0")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name"))
                        .arg(opt("icon").default_value("🏷️"))
                        .arg(opt("color").default_value("#6b7280")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .arg(req("date"))
                        .arg(req("amount").allow_negative_numbers(true))
                        .arg(req("category"))
                        .arg(opt("type").default_value("expense"))
                        .arg(opt("account"))
                        .arg(opt("currency"))
                        .arg(opt("description"))
                        .arg(opt("tags").help("Semicolon separated")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(opt("month"))
                        .arg(opt("account"))
                        .arg(opt("category"))
                        .arg(opt("limit").value_parser(value_parser!(usize)))
                        .arg(json_flag()),
                )
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(
                    Command::new("generate")
                        .about("Create this month's instances of recurring rules")
                        .arg(opt("today")),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring transaction rules")
                .subcommand(
                    Command::new("add")
                        .arg(req("amount"))
                        .arg(req("category"))
                        .arg(req("day").value_parser(value_parser!(u32).range(1..=31)))
                        .arg(opt("type").default_value("expense"))
                        .arg(opt("frequency").default_value("monthly"))
                        .arg(opt("account"))
                        .arg(opt("currency"))
                        .arg(opt("description")),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("bill")
                .about("Recurring payment reminders")
                .subcommand(
                    Command::new("add")
                        .arg(req("description"))
                        .arg(req("amount"))
                        .arg(req("due"))
                        .arg(opt("category").default_value("bills"))
                        .arg(opt("frequency").default_value("monthly"))
                        .arg(opt("currency")),
                )
                .subcommand(Command::new("list").arg(opt("until")).arg(json_flag()))
                .subcommand(Command::new("paid").arg(id_arg()))
                .subcommand(Command::new("toggle").arg(id_arg()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly spending limits")
                .subcommand(
                    Command::new("set")
                        .arg(opt("category").help("Omit to set the overall limit"))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .help("Limit; omit to clear it"),
                        ),
                )
                .subcommand(Command::new("status").arg(opt("month")).arg(json_flag())),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(req("name"))
                        .arg(req("target"))
                        .arg(opt("current").default_value("0"))
                        .arg(opt("deadline"))
                        .arg(opt("category").default_value("other"))
                        .arg(opt("description")),
                )
                .subcommand(Command::new("set").arg(id_arg()).arg(req("amount")))
                .subcommand(
                    Command::new("contribute")
                        .arg(id_arg())
                        .arg(req("amount").allow_negative_numbers(true)),
                )
                .subcommand(Command::new("list").arg(json_flag()))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("settings")
                .about("Preferences")
                .subcommand(Command::new("show").arg(json_flag()))
                .subcommand(
                    Command::new("set")
                        .arg(opt("theme"))
                        .arg(opt("currency"))
                        .arg(opt("privacy").value_parser(value_parser!(bool)))
                        .arg(opt("onboarded").value_parser(value_parser!(bool))),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import a bank CSV export")
                .subcommand(
                    Command::new("transactions")
                        .arg(req("path"))
                        .arg(opt("account"))
                        .arg(opt("limit").value_parser(value_parser!(usize)))
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue)
                                .help("Validate and preview without saving"),
                        ),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(Command::new("transactions").arg(req("out")))
                .subcommand(Command::new("archive").arg(req("out"))),
        )
        .subcommand(
            Command::new("restore")
                .about("Restore from an export archive")
                .subcommand(
                    Command::new("archive")
                        .arg(req("path"))
                        .arg(opt("limit").value_parser(value_parser!(usize)))
                        .arg(
                            Arg::new("dry-run")
                                .long("dry-run")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("backup")
                .about("Whole-store JSON backup")
                .subcommand(Command::new("create").arg(req("out")))
                .subcommand(Command::new("restore").arg(req("path"))),
        )
}
