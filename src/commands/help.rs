//! /help text.

pub(super) fn help_text() -> String {
    [
        "*Bot Commands*",
        "",
        "`/add_challenge` or `/newchallenge` `\"name1\", \"name2\" points`",
        "_Adds challenges that don't exist yet._",
        "Example: `/add_challenge \"Plank\", \"Push-ups\" 10`",
        "",
        "`/all_challenges` or `/showallchallenges`",
        "_Lists all challenges._",
        "",
        "`/search` or `/findchallenge` `keyword`",
        "_Search for challenges._",
        "",
        "`/complete` or `/finishchallenge` `[@user] name1, name2`",
        "_Mark challenges as completed._",
        "",
        "`/remaining` or `/pendingchallenges` `[@user]`",
        "_Show the challenges still to do._",
        "",
        "`/random_challenge` or `/surpriseme` `[@user]`",
        "_Pick a random unfinished challenge._",
        "",
        "`/user_stats` or `/getuserstats` `[@user] [detail]`",
        "_Points, completions and the most recent one._",
        "",
        "`/leaderboard` or `/showrankings`",
        "_Show the leaderboard._",
        "",
        "`/progress` or `/checkprogress` `[@user1 @user2 ...]`",
        "_Compare progress between users._",
        "",
        "`/delete_challenge` or `/removechallenge` `name`",
        "_Delete a challenge (admins only)._",
        "",
        "Commands also work with `!` instead of `/`.",
    ]
    .join("\n")
}
