// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("duoledger")
        .version(crate_version!())
        .about("Household finance tracker for couples")
        .subcommand(Command::new("init").about("Create the database if it does not exist"))
        .subcommand(
            Command::new("household")
                .about("Manage households")
                .subcommand(
                    Command::new("add")
                        .about("Create a household (activated if none is active)")
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").about("List households"))
                .subcommand(
                    Command::new("use")
                        .about("Switch the active household")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("user")
                .about("Manage household members")
                .subcommand(
                    Command::new("add")
                        .about("Add a member to the active household")
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list").about("List members"))
                .subcommand(
                    Command::new("use")
                        .about("Set the member stamped on new transactions")
                        .arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("account")
                .about("Manage bank accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .help("Free-form kind, e.g. checking, savings, wallet"),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("card")
                .about("Manage credit cards")
                .subcommand(
                    Command::new("add").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tag")
                .about("Manage tags")
                .subcommand(
                    Command::new("add").arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("rm").arg(Arg::new("name").long("name").required(true)),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and list transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Positive amount like 1.234,56"),
                        )
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .value_parser(["income", "expense"])
                                .default_value("expense"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card"))
                        .arg(
                            Arg::new("tags")
                                .long("tags")
                                .help("Comma-separated tag names"),
                        )
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .value_parser(value_parser!(u32))
                                .help("Split an expense into N monthly installments (N >= 2)"),
                        )
                        .arg(
                            Arg::new("monthly")
                                .long("monthly")
                                .action(ArgAction::SetTrue)
                                .help("Mark as a monthly recurring entry"),
                        )
                        .arg(
                            Arg::new("third_party")
                                .long("third-party")
                                .help("Name of the person this expense will be reimbursed by"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions")
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("user").long("user"))
                        .arg(
                            Arg::new("third_party")
                                .long("third-party")
                                .action(ArgAction::SetTrue)
                                .help("Only reimbursable expenses"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
        )
        .subcommand(
            Command::new("fixed")
                .about("Fixed expenses and their monthly occurrences")
                .subcommand(
                    Command::new("add")
                        .about("Create a fixed-expense template")
                        .arg(Arg::new("description").long("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Positive amount like 1.234,56"),
                        )
                        .arg(
                            Arg::new("due_day")
                                .long("due-day")
                                .required(true)
                                .value_parser(value_parser!(u32))
                                .help("Day of month 1-31, clamped to short months"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("card").long("card")),
                )
                .subcommand(json_flags(Command::new("list").about("List templates")))
                .subcommand(
                    Command::new("edit")
                        .about("Edit a template; pending occurrences are refreshed")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("description").long("description"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(
                            Arg::new("due_day")
                                .long("due-day")
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(
                            Arg::new("activate")
                                .long("activate")
                                .action(ArgAction::SetTrue),
                        )
                        .arg(
                            Arg::new("deactivate")
                                .long("deactivate")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a template and all of its occurrences")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("due")
                        .about("Materialize and list a month's occurrences")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM")),
                ))
                .subcommand(
                    Command::new("pay")
                        .about("Mark an occurrence paid, recording the transaction")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                ),
        )
        .subcommand(
            Command::new("thirdparty")
                .about("Expenses to be reimbursed by someone outside the household")
                .subcommand(json_flags(
                    Command::new("status")
                        .about("Show a month's reimbursable expenses and totals")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM"))
                        .arg(Arg::new("search").long("search"))
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_parser(["pending", "paid"]),
                        ),
                ))
                .subcommand(
                    Command::new("pay")
                        .about("Mark a reimbursable expense as settled")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category budgets")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM"))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Positive amount like 1.234,56"),
                        ),
                )
                .subcommand(
                    Command::new("list").arg(Arg::new("month").long("month").help("YYYY-MM")),
                )
                .subcommand(json_flags(
                    Command::new("report")
                        .about("Budget vs spent per category")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM")),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Aggregates over the ledger")
                .subcommand(json_flags(
                    Command::new("balances").about("Net balance per account and card"),
                ))
                .subcommand(json_flags(
                    Command::new("cashflow")
                        .about("Monthly income and expense totals")
                        .arg(
                            Arg::new("months")
                                .long("months")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(json_flags(
                    Command::new("spend-by-category")
                        .about("Expense totals per category for one month")
                        .arg(Arg::new("month").long("month").required(true).help("YYYY-MM")),
                )),
        )
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}
