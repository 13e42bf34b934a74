use askama::Template;
use shared::domain::{ClassSummary, UserSummary};

/// One row of the tasks page.
pub struct TaskRow {
    pub title: String,
    pub description: String,
    pub due: String,
    pub status: &'static str,
    pub progress: String,
    pub train_href: String,
}

#[derive(Template)]
#[template(path = "tasks.html")]
pub struct TasksTemplate {
    pub site_title: String,
    pub viewer_id: i64,
    pub viewer_name: String,
    pub rows: Vec<TaskRow>,
}

#[derive(Template)]
#[template(path = "train.html")]
pub struct TrainTemplate {
    pub site_title: String,
    pub title: String,
    pub exercise: &'static str,
    pub student_task: i64,
    pub sentence_count: usize,
    pub sentences_json: String,
}

#[derive(Template)]
#[template(path = "revise.html")]
pub struct ReviseTemplate {
    pub site_title: String,
    pub viewer_name: String,
    pub exercise: &'static str,
    pub due_count: usize,
    pub revisions_json: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub site_title: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub site_title: String,
}

#[derive(Template)]
#[template(path = "new_sentence.html")]
pub struct NewSentenceTemplate {
    pub site_title: String,
}

#[derive(Template)]
#[template(path = "new_task.html")]
pub struct NewTaskTemplate {
    pub site_title: String,
    pub classes: Vec<ClassSummary>,
}

#[derive(Template)]
#[template(path = "classes.html")]
pub struct ClassesTemplate {
    pub site_title: String,
    pub viewer_id: i64,
    pub viewer_name: String,
    pub classes: Vec<ClassSummary>,
}

#[derive(Template)]
#[template(path = "class.html")]
pub struct ClassTemplate {
    pub site_title: String,
    pub class: ClassSummary,
    pub students: Vec<UserSummary>,
}

#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub site_title: String,
    pub user: UserSummary,
    pub role: &'static str,
    pub class_name: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub message: String,
}
