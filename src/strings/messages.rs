//! # Messages
//!
//! User-facing texts of the demo pages and their button labels.

pub const FIRST: &str = "This is the first page!\nTap 'Start' to continue...";

pub const SECOND: &str = "Try to tap on the 'Deleted button' or type 'Start'. You will receive an error.\n\
     The only way to get to the next page is the 'Go to next' inline button.";

pub fn third_before(data: &str, id: &str) -> String {
    format!(
        "You passed 'data' and 'id' with the previous payload.\nData: {data}\nID: {id}\nNow press the 'Tap it' button"
    )
}

pub const THIRD_NAVIGATION: &str = "Or use the keyboard to move around.";

pub const THIRD_AFTER: &str = "Your stage was not changed, but the page was updated.\n\
     Press 'Tap it' in the previous message again to check.";

pub const FOURTH: &str = "Only admins are allowed to go to the next page.\n\
     Press 'Next' to check it. You will receive an error until you press 'Admin'.";

pub const FOURTH_ADMIN: &str = "You are an admin now. 'Next' will let you through.";

pub const FIFTH: &str = "Send me any file (nothing is saved, promise) to finish the tour.\n\
     Or press 'User' to drop your admin rights and start over.";

pub const FIFTH_WAITING: &str = "That's not a file. Send a file, or go to the beginning.";

pub fn files_received(names: &[&str]) -> String {
    format!(
        "Got {} file(s): {}\nCongrats, you've completed the tour!",
        names.len(),
        names.join(", ")
    )
}

pub const ERROR: &str = "Input error :c";

pub mod buttons {
    pub const START: &str = "Start";
    pub const GO_TO_NEXT: &str = "Go to next";
    pub const DELETED: &str = "Deleted button";
    pub const TAP_IT: &str = "Tap it";
    pub const TO_FOURTH: &str = "Go to fourth page";
    pub const GO_TO_PREVIOUS: &str = "Go to previous";
    pub const GO_TO_BEGINNING: &str = "Go to beginning";
    pub const ADMIN: &str = "Admin";
    pub const NEXT: &str = "Next";
    pub const GO_BACK: &str = "Go back";
    pub const USER: &str = "User";
}
