//! First-run demo data. Production and development startups feed a fixture
//! user plus a handful of demo blogs when the store holds no users at all;
//! test mode never seeds (suites build their own fixtures over the
//! test-support surface).

use tracing::info;

use crate::config::Mode;
use crate::error::AppResult;
use crate::storage::SharedStore;

struct DemoBlog {
    title: &'static str,
    author: &'static str,
    url: &'static str,
    likes: i64,
}

const DEMO_BLOGS: [DemoBlog; 7] = [
    DemoBlog {
        title: "Building Modern Web Applications with React",
        author: "Michael Chan",
        url: "https://reactpatterns.com/",
        likes: 7,
    },
    DemoBlog {
        title: "The Art of Clean Code: Best Practices for Developers",
        author: "Edsger W. Dijkstra",
        url: "http://www.u.arizona.edu/~rubinson/copyright_violations/Go_To_Considered_Harmful.html",
        likes: 5,
    },
    DemoBlog {
        title: "Mastering JavaScript: From Basics to Advanced Concepts",
        author: "Edsger W. Dijkstra",
        url: "http://www.cs.utexas.edu/~EWD/transcriptions/EWD08xx/EWD808.html",
        likes: 12,
    },
    DemoBlog {
        title: "Full-Stack Development: A Complete Guide",
        author: "Robert C. Martin",
        url: "http://blog.cleancoder.com/uncle-bob/2017/05/05/TestDefinitions.htmll",
        likes: 10,
    },
    DemoBlog {
        title: "Node.js and Express: Building RESTful APIs",
        author: "Robert C. Martin",
        url: "http://blog.cleancoder.com/uncle-bob/2017/03/03/TDD-Harms-Architecture.html",
        likes: 0,
    },
    DemoBlog {
        title: "Database Design: MongoDB vs SQL",
        author: "Robert C. Martin",
        url: "http://blog.cleancoder.com/uncle-bob/2016/05/01/TypeWars.html",
        likes: 2,
    },
    DemoBlog {
        title: "Welcome to Our Blog Platform",
        author: "Admin",
        url: "https://test.com",
        likes: 2,
    },
];

/// Feed the mode's fixture user and the demo blogs if the store is empty.
/// Returns whether anything was fed. A store with any existing user is left
/// untouched.
pub fn feed_if_empty(store: &SharedStore, mode: Mode) -> AppResult<bool> {
    let (username, name, password) = match mode {
        Mode::Production => ("test", "test", "test1234"),
        Mode::Development => ("admin", "admin", "admin1234"),
        Mode::Test => return Ok(false),
    };

    let mut guard = store.0.lock();
    if guard.user_count() > 0 {
        info!(target: "bloglist::seed", "data already fed for {}", mode.as_str());
        return Ok(false);
    }
    let user = guard.create_user(username, name, password)?;
    for demo in DEMO_BLOGS.iter() {
        guard.insert_blog(None, demo.title, demo.author, demo.url, user.id, demo.likes)?;
    }
    info!(target: "bloglist::seed", "data fed for {}: 1 user, {} blogs", mode.as_str(), DEMO_BLOGS.len());
    Ok(true)
}
