//! 待辦清單示例
//!
//! 以連線模擬畫面元件：每個連線在狀態變更後重新執行選擇器，
//! 只有結果改變時才「重新渲染」。

use anyhow::Result;
use memo::prelude::*;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: u32,
    title: String,
    done: bool,
}

#[derive(Debug, Clone, Default)]
struct State {
    todos: Rc<Vec<Rc<Todo>>>,
    hide_done: bool,
}

type Tools<'a> = StoreTools<'a, State>;

fn select_hide_done(tools: &Tools<'_>, _: ()) -> memo::Result<bool> {
    Ok(tools.state().hide_done)
}

fn select_visible_todos(tools: &Tools<'_>, _: ()) -> memo::Result<Rc<Vec<Rc<Todo>>>> {
    let state = tools.state();
    tools.memo(
        || {
            if state.hide_done {
                Rc::new(
                    state
                        .todos
                        .iter()
                        .filter(|todo| !todo.done)
                        .cloned()
                        .collect(),
                )
            } else {
                Rc::clone(&state.todos)
            }
        },
        deps![&state.todos, state.hide_done],
    )
}

fn select_visible_todos_count(tools: &Tools<'_>, _: ()) -> memo::Result<usize> {
    Ok(tools.execute(select_visible_todos, ())?.len())
}

fn select_todo(tools: &Tools<'_>, id: u32) -> memo::Result<Option<Rc<Todo>>> {
    let state = tools.state();
    tools.memo(
        || state.todos.iter().find(|todo| todo.id == id).cloned(),
        deps![&state.todos, id],
    )
}

fn select_done_count(tools: &Tools<'_>, _: ()) -> memo::Result<usize> {
    let state = tools.state();
    let done = tools.memo(
        || Rc::new(state.todos.iter().filter(|todo| todo.done).count()),
        deps![&state.todos],
    )?;
    Ok(*done)
}

fn add_todo(store: &SimpleStore<State>, id: u32, title: &str) {
    store.update(|draft| {
        Rc::make_mut(&mut draft.todos).push(Rc::new(Todo {
            id,
            title: title.to_string(),
            done: false,
        }));
    });
}

fn toggle_todo(store: &SimpleStore<State>, id: u32) {
    store.update(|draft| {
        let todos = Rc::make_mut(&mut draft.todos);
        if let Some(todo) = todos.iter_mut().find(|todo| todo.id == id) {
            let todo = Rc::make_mut(todo);
            todo.done = !todo.done;
        }
    });
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("memo_engine=info".parse()?),
        )
        .init();

    println!("=== 待辦清單示例 ===\n");

    let store = Rc::new(SimpleStore::new(State::default()));
    let manager = StoreMemoManager::new(Rc::clone(&store));

    let _hide_done = Connection::new(
        &manager,
        "hide-done",
        select_hide_done,
        (),
        |hide: &bool| println!("  [按鈕] {}", if *hide { "Show all" } else { "Hide done" }),
    )?;
    let visible = Connection::new(
        &manager,
        "visible",
        select_visible_todos,
        (),
        |todos: &Rc<Vec<Rc<Todo>>>| println!("  [清單] 重新渲染 {} 項", todos.len()),
    )?;
    let _count = Connection::new(
        &manager,
        "count",
        select_visible_todos_count,
        (),
        |count: &usize| println!("  [計數] Count: {count}"),
    )?;
    let _done = Connection::new(
        &manager,
        "done",
        select_done_count,
        (),
        |count: &usize| println!("  [計數] Done: {count}"),
    )?;

    println!("新增三個待辦事項:");
    for (id, title) in ["買牛奶", "寫報告", "整理桌面"].into_iter().enumerate() {
        add_todo(&store, id as u32, title);
    }

    // 每個待辦事項一個連線，只有自己的項目改變時才重新渲染
    let items: Vec<Connection<Option<Rc<Todo>>>> = visible
        .current()
        .iter()
        .map(|todo| {
            let id = todo.id;
            let on_change = move |todo: &Option<Rc<Todo>>| {
                if let Some(todo) = todo {
                    println!("  [項目 {id}] {} done={}", todo.title, todo.done);
                }
            };
            Connection::new(&manager, format!("todo-{id}"), select_todo, id, on_change)
        })
        .collect::<memo::Result<_>>()?;

    println!("\n完成第 1 項:");
    toggle_todo(&store, 1);

    println!("\n隱藏已完成:");
    store.update(|draft| draft.hide_done = !draft.hide_done);

    println!("\n顯示全部:");
    store.update(|draft| draft.hide_done = !draft.hide_done);

    let stats = manager.memo_manager().stats();
    println!(
        "\n上下文: {}，命中: {}，重新計算: {}，命中率: {:.1}%",
        manager.memo_manager().context_count(),
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    drop(items);
    println!(
        "釋放項目連線後剩餘上下文: {}",
        manager.memo_manager().context_count()
    );

    Ok(())
}
