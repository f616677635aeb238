use crate::assessment::Category;
use crate::config::{CategoryConfig, MockExamPolicy};
use crate::plan::model::{Difficulty, Task, TaskKind};

// Guards floor() against allocations like 359.99999999 minutes.
const FLOOR_EPSILON: f64 = 1e-9;

/// Deterministic id for the `index`-th (1-based) task of a category in a week.
pub fn task_id(week_number: u32, category: Category, index: u32) -> String {
    format!("task-w{}-{}-{}", week_number, category, index)
}

pub fn mock_exam_task_id(week_number: u32) -> String {
    format!("task-mock-exam-w{}", week_number)
}

/// Number of tasks an allocation buys. Any positive allocation buys at least one.
pub fn task_count(allocated_minutes: f64, average_task_minutes: u32) -> u32 {
    if allocated_minutes <= 0.0 || average_task_minutes == 0 {
        return 0;
    }
    let count = (allocated_minutes / average_task_minutes as f64 + FLOOR_EPSILON).floor() as u32;
    count.max(1)
}

/// Expand one category's weekly allocation into an ordered task list.
///
/// Tasks rotate through the category's sub-parts so coverage stays even as the
/// count grows, and all of them carry the week's difficulty.
pub fn synthesize_tasks(
    config: &CategoryConfig,
    week_number: u32,
    allocated_minutes: f64,
    difficulty: Difficulty,
) -> Vec<Task> {
    let count = task_count(allocated_minutes, config.average_task_minutes);
    (0..count)
        .map(|i| practice_task(config, week_number, i, difficulty))
        .collect()
}

fn practice_task(config: &CategoryConfig, week_number: u32, i: u32, difficulty: Difficulty) -> Task {
    let category = config.category;
    let part = if config.parts.is_empty() {
        None
    } else {
        Some(config.parts[i as usize % config.parts.len()])
    };

    let (section, title, description) = match part {
        Some(p) => (
            format!("{}-part{}", category, p),
            format!("{} Part {}", category.display_name(), p),
            practice_description(category, Some(p)),
        ),
        None => (
            category.to_string(),
            format!("{} Practice", category.display_name()),
            practice_description(category, None),
        ),
    };

    Task {
        id: task_id(week_number, category, i + 1),
        week_number,
        kind: TaskKind::from(category),
        section,
        title,
        description: Some(description),
        estimated_minutes: config.average_task_minutes,
        difficulty,
        completed: false,
        completed_at: None,
        score: None,
    }
}

fn practice_description(category: Category, part: Option<u8>) -> String {
    let skill = match category {
        Category::Reading => "reading comprehension",
        Category::Listening => "listening comprehension",
        Category::Grammar => "grammar and vocabulary",
        Category::Writing => "writing skills with feedback",
        Category::Speaking => "speaking skills",
    };
    match part {
        Some(p) => format!("Practice {} - Part {}", skill, p),
        None => format!("Practice {}", skill),
    }
}

pub fn mock_exam_task(week_number: u32, number: u32, policy: &MockExamPolicy) -> Task {
    Task {
        id: mock_exam_task_id(week_number),
        week_number,
        kind: TaskKind::MockExam,
        section: "mock-exam".into(),
        title: format!("Mock Exam {}", number),
        description: Some("Complete full mock exam under timed conditions".into()),
        estimated_minutes: policy.minutes,
        difficulty: Difficulty::Hard,
        completed: false,
        completed_at: None,
        score: None,
    }
}
